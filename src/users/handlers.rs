use std::collections::HashMap;

use axum::{
    extract::{Path, Request, State},
    handler::Handler,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state, Next},
    response::Response,
    routing::get,
    Json, Router,
};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    auth::validators::{request_validator, sign_up_validator},
    ctx::{path_id, request_ctx, Ctx, JsonBody},
    error::ApiError,
    state::AppState,
    users::{
        dto::{UserPatch, UserRequest, UserResponse},
        repo_types::User,
    },
};

pub fn user_routes(state: &AppState) -> Router<AppState> {
    let sign_up = create_user
        .layer(from_fn_with_state(state.clone(), sign_up_validator))
        .layer(from_fn(request_ctx::<UserRequest>));

    let member = Router::new()
        .route("/users/:userId", get(get_user).post(update_user))
        .route_layer(from_fn_with_state(state.clone(), request_validator))
        .route_layer(from_fn_with_state(state.clone(), user_ctx));

    Router::new()
        .route("/users", get(list_users).put(sign_up))
        .merge(member)
}

/// Resolves `:userId` to a [`User`] and attaches it to the request.
#[instrument(skip_all)]
pub async fn user_ctx(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let id = path_id(&params, "userId")?;
    debug!(user_id = id, "user id from parameter");

    let user = match state.users.user_by_id(id).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(user_id = id, "user not found");
            return Err(ApiError::not_found("user not found"));
        }
        Err(e) => {
            error!(error = %e, user_id = id, "user_by_id failed");
            return Err(ApiError::internal(e));
        }
    };

    req.extensions_mut().insert(Ctx(user));
    Ok(next.run(req).await)
}

#[instrument(skip_all)]
pub async fn get_user(Ctx(user): Ctx<User>) -> Json<UserResponse> {
    Json(user.into())
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.users.users().await.map_err(|e| {
        error!(error = %e, "users failed");
        ApiError::internal(e)
    })?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    Ctx(user): Ctx<User>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = match state.users.insert_user(user).await {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "insert_user failed");
            return Err(ApiError::internal(e));
        }
    };
    info!(user_id = user.id, email = %user.email, "user created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    Ctx(current): Ctx<User>,
    JsonBody(patch): JsonBody<UserPatch>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = patch.merge(&current)?;

    if user.email != current.email {
        match state.auth.email_available(&user.email).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(user_id = current.id, email = %user.email, "email already registered");
                return Err(ApiError::conflict("email taken"));
            }
            Err(e) => {
                error!(error = %e, "email_available failed");
                return Err(ApiError::internal(e));
            }
        }
    }

    if let Err(e) = state.users.update_user(user.id, user.clone()).await {
        error!(error = %e, user_id = user.id, "update_user failed");
        return Err(ApiError::internal(e));
    }
    info!(user_id = user.id, "user updated");
    Ok(Json(user.into()))
}
