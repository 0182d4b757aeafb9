//! Pass/block filters that run once the context middleware has attached
//! the entities they inspect.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, instrument, warn};

use crate::{
    auth::extractors::AuthUser,
    ctx::Ctx,
    error::ApiError,
    state::AppState,
    users::repo_types::User,
};

/// Blocks unless the token principal is the user resolved from the path.
#[instrument(skip_all)]
pub async fn request_validator(
    AuthUser(principal): AuthUser,
    Ctx(user): Ctx<User>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if user.id != principal {
        warn!(principal, user_id = user.id, "principal does not own requested user");
        return Err(ApiError::unauthorized());
    }
    debug!(principal, "principal matches user");
    Ok(next.run(req).await)
}

/// Blocks sign-up when the bound user's email is already registered.
#[instrument(skip_all)]
pub async fn sign_up_validator(
    State(state): State<AppState>,
    Ctx(user): Ctx<User>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let available = match state.auth.email_available(&user.email).await {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "email_available failed");
            return Err(ApiError::internal(e));
        }
    };
    if !available {
        warn!(email = %user.email, "email already registered");
        return Err(ApiError::conflict("email taken"));
    }
    Ok(next.run(req).await)
}

/// Attaches the user named by the bearer token, for routes that carry no
/// user id in the path.
#[instrument(skip_all)]
pub async fn principal_ctx(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = match state.users.user_by_id(principal).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(principal, "token principal has no user");
            return Err(ApiError::unauthorized());
        }
        Err(e) => {
            error!(error = %e, "user_by_id failed");
            return Err(ApiError::internal(e));
        }
    };
    req.extensions_mut().insert(Ctx(user));
    Ok(next.run(req).await)
}
