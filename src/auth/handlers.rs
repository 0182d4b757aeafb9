use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        claims::Claims,
        dto::{CredentialsRequest, TokenResponse},
        jwt::JwtKeys,
    },
    ctx::JsonBody,
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CredentialsRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let creds = payload.validate()?;

    let authenticated = match state.auth.authenticate(&creds.email, &creds.password).await {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "authenticate failed");
            return Err(ApiError::internal(e));
        }
    };

    if !authenticated {
        warn!(email = %creds.email, "login invalid credentials");
        return Err(ApiError::forbidden("Invalid credentials"));
    }

    let user = match state.users.user_by_email(&creds.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            error!(email = %creds.email, "authenticated email has no user");
            return Err(ApiError::internal_msg("user not found"));
        }
        Err(e) => {
            error!(error = %e, "user_by_email failed");
            return Err(ApiError::internal(e));
        }
    };

    let keys = JwtKeys::from_ref(&state);
    let token = match keys.sign(&Claims { id: user.id }) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "jwt sign failed");
            return Err(ApiError::internal(e));
        }
    };

    info!(user_id = user.id, "user logged in");
    Ok(Json(TokenResponse { token }))
}
