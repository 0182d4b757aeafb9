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
    auth::validators::{principal_ctx, request_validator},
    ctx::{path_id, request_ctx, Ctx, JsonBody},
    error::ApiError,
    pills::{
        dto::{PillRequest, PillResponse},
        repo_types::Pill,
    },
    state::AppState,
    users::{handlers::user_ctx, repo_types::User},
};

pub fn pill_routes(state: &AppState) -> Router<AppState> {
    let user_scoped = Router::new()
        .route(
            "/users/:userId/pills",
            get(list_pills).put(create_pill.layer(from_fn(request_ctx::<PillRequest>))),
        )
        .route(
            "/users/:userId/pills/:pillId",
            get(get_pill)
                .post(update_pill)
                .route_layer(from_fn_with_state(state.clone(), pill_ctx)),
        )
        .route_layer(from_fn_with_state(state.clone(), request_validator))
        .route_layer(from_fn_with_state(state.clone(), user_ctx));

    let token_scoped = Router::new()
        .route("/pills/:pillId", get(get_pill).post(update_pill))
        .route_layer(from_fn_with_state(state.clone(), pill_ctx))
        .route_layer(from_fn_with_state(state.clone(), principal_ctx));

    user_scoped.merge(token_scoped)
}

/// Resolves `:pillId` to a [`Pill`] and attaches it to the request.
#[instrument(skip_all)]
pub async fn pill_ctx(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let id = path_id(&params, "pillId")?;
    debug!(pill_id = id, "pill id from parameter");

    let pill = match state.pills.pill(id).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            warn!(pill_id = id, "pill not found");
            return Err(ApiError::not_found("pill not found"));
        }
        Err(e) => {
            error!(error = %e, pill_id = id, "pill lookup failed");
            return Err(ApiError::internal(e));
        }
    };

    req.extensions_mut().insert(Ctx(pill));
    Ok(next.run(req).await)
}

fn ensure_owner(pill: &Pill, user: &User) -> Result<(), ApiError> {
    if pill.user_id != user.id {
        warn!(pill_id = pill.id, owner = pill.user_id, user_id = user.id, "pill owner mismatch");
        return Err(ApiError::bad_request(
            "parameter pill user id should match the parameter user ID",
        ));
    }
    Ok(())
}

#[instrument(skip_all)]
pub async fn list_pills(
    State(state): State<AppState>,
    Ctx(user): Ctx<User>,
) -> Result<Json<Vec<PillResponse>>, ApiError> {
    let pills = state.pills.pills(user.id).await.map_err(|e| {
        error!(error = %e, user_id = user.id, "pills failed");
        ApiError::internal(e)
    })?;
    Ok(Json(pills.into_iter().map(PillResponse::from).collect()))
}

#[instrument(skip_all)]
pub async fn get_pill(
    Ctx(user): Ctx<User>,
    Ctx(pill): Ctx<Pill>,
) -> Result<Json<PillResponse>, ApiError> {
    ensure_owner(&pill, &user)?;
    Ok(Json(pill.into()))
}

#[instrument(skip_all)]
pub async fn create_pill(
    State(state): State<AppState>,
    Ctx(pill): Ctx<Pill>,
) -> Result<(StatusCode, Json<PillResponse>), ApiError> {
    let pill = match state.pills.create_pill(pill).await {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "create_pill failed");
            return Err(ApiError::internal(e));
        }
    };
    info!(pill_id = pill.id, user_id = pill.user_id, "pill created");
    Ok((StatusCode::CREATED, Json(pill.into())))
}

#[instrument(skip_all)]
pub async fn update_pill(
    State(state): State<AppState>,
    Ctx(user): Ctx<User>,
    Ctx(current): Ctx<Pill>,
    JsonBody(body): JsonBody<PillRequest>,
) -> Result<Json<PillResponse>, ApiError> {
    ensure_owner(&current, &user)?;
    let pill = body.into_update(&current, &user)?;

    if let Err(e) = state.pills.update_pill(pill.id, pill.clone()).await {
        error!(error = %e, pill_id = pill.id, "update_pill failed");
        return Err(ApiError::internal(e));
    }
    info!(pill_id = pill.id, user_id = user.id, "pill updated");
    Ok(Json(pill.into()))
}
