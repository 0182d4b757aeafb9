use std::collections::HashMap;

use axum::{
    extract::{Path, Request, State},
    handler::Handler,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state, Next},
    response::Response,
    routing::{get, put},
    Json, Router,
};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    auth::validators::request_validator,
    boxes::{
        dto::{BoxResponse, CloseEventRequest, EventResponse, OpenEventRequest},
        repo_types::{CloseEvent, OpenEvent, PillBox},
    },
    ctx::{path_id, request_ctx, Ctx},
    error::ApiError,
    state::AppState,
    users::{handlers::user_ctx, repo_types::User},
};

pub fn box_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/users/:userId/boxes", get(list_boxes))
        .route(
            "/users/:userId/boxes/:boxId",
            get(get_box).route_layer(from_fn_with_state(state.clone(), box_ctx)),
        )
        .route(
            "/users/:userId/box/open",
            put(insert_open_event.layer(from_fn(request_ctx::<OpenEventRequest>))),
        )
        .route(
            "/users/:userId/box/close",
            put(insert_close_event.layer(from_fn(request_ctx::<CloseEventRequest>))),
        )
        .route_layer(from_fn_with_state(state.clone(), request_validator))
        .route_layer(from_fn_with_state(state.clone(), user_ctx))
}

/// Resolves `:boxId` to a [`PillBox`] and attaches it to the request.
#[instrument(skip_all)]
pub async fn box_ctx(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let id = path_id(&params, "boxId")?;
    debug!(box_id = id, "box id from parameter");

    let pill_box = match state.boxes.box_by_id(id).await {
        Ok(Some(b)) => b,
        Ok(None) => {
            warn!(box_id = id, "box not found");
            return Err(ApiError::not_found("box not found"));
        }
        Err(e) => {
            error!(error = %e, box_id = id, "box lookup failed");
            return Err(ApiError::internal(e));
        }
    };

    req.extensions_mut().insert(Ctx(pill_box));
    Ok(next.run(req).await)
}

#[instrument(skip_all)]
pub async fn list_boxes(
    State(state): State<AppState>,
    Ctx(user): Ctx<User>,
) -> Result<Json<Vec<BoxResponse>>, ApiError> {
    let boxes = state.boxes.boxes(user.id).await.map_err(|e| {
        error!(error = %e, user_id = user.id, "boxes failed");
        ApiError::internal(e)
    })?;
    Ok(Json(boxes.into_iter().map(BoxResponse::from).collect()))
}

#[instrument(skip_all)]
pub async fn get_box(
    Ctx(user): Ctx<User>,
    Ctx(pill_box): Ctx<PillBox>,
) -> Result<Json<BoxResponse>, ApiError> {
    if pill_box.user_id != user.id {
        warn!(box_id = pill_box.id, user_id = user.id, "box owner mismatch");
        return Err(ApiError::bad_request(
            "parameter box user id should match the parameter user ID",
        ));
    }
    Ok(Json(pill_box.into()))
}

/// The event's owner was settled against the path user when the body was bound.
#[instrument(skip_all)]
pub async fn insert_open_event(
    State(state): State<AppState>,
    Ctx(user): Ctx<User>,
    Ctx(event): Ctx<OpenEvent>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    let event = match state.boxes.insert_open_event(event).await {
        Ok(e) => e,
        Err(e) => {
            error!(error = %e, "insert_open_event failed");
            return Err(ApiError::internal(e));
        }
    };
    info!(event_id = event.id, comp_id = event.comp_id, user_id = user.id, "compartment opened");
    Ok((StatusCode::CREATED, Json(event.into())))
}

#[instrument(skip_all)]
pub async fn insert_close_event(
    State(state): State<AppState>,
    Ctx(user): Ctx<User>,
    Ctx(event): Ctx<CloseEvent>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    let event = match state.boxes.insert_close_event(event).await {
        Ok(e) => e,
        Err(e) => {
            error!(error = %e, "insert_close_event failed");
            return Err(ApiError::internal(e));
        }
    };
    info!(event_id = event.id, comp_id = event.comp_id, user_id = user.id, "compartment closed");
    Ok((StatusCode::CREATED, Json(event.into())))
}
