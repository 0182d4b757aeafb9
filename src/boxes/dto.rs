use axum::http::Extensions;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    boxes::repo_types::{CloseEvent, OpenEvent, PillBox},
    ctx::{ctx_value, Bind},
    error::ApiError,
    users::repo_types::User,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub comp_id: Option<i64>,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub time: Option<OffsetDateTime>,
}

struct ResolvedEvent {
    comp_id: i64,
    user_id: i64,
    time: OffsetDateTime,
}

impl EventRequest {
    fn resolve(self, extensions: &Extensions) -> Result<ResolvedEvent, ApiError> {
        let user = ctx_value::<User>(extensions)
            .ok_or_else(|| ApiError::internal_msg("missing request context"))?;

        let comp_id = self
            .comp_id
            .ok_or_else(|| ApiError::bad_request("compId is required"))?;
        if comp_id <= 0 {
            return Err(ApiError::bad_request("compId must be positive"));
        }
        if self.user_id != 0 && self.user_id != user.id {
            return Err(ApiError::bad_request(
                "event user id should match the parameter user ID",
            ));
        }

        Ok(ResolvedEvent {
            comp_id,
            user_id: user.id,
            time: self.time.unwrap_or_else(OffsetDateTime::now_utc),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct OpenEventRequest(pub EventRequest);

impl Bind for OpenEventRequest {
    type Target = OpenEvent;

    fn bind(self, extensions: &Extensions) -> Result<OpenEvent, ApiError> {
        let e = self.0.resolve(extensions)?;
        Ok(OpenEvent {
            id: 0,
            comp_id: e.comp_id,
            user_id: e.user_id,
            time: e.time,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct CloseEventRequest(pub EventRequest);

impl Bind for CloseEventRequest {
    type Target = CloseEvent;

    fn bind(self, extensions: &Extensions) -> Result<CloseEvent, ApiError> {
        let e = self.0.resolve(extensions)?;
        Ok(CloseEvent {
            id: 0,
            comp_id: e.comp_id,
            user_id: e.user_id,
            time: e.time,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxResponse {
    pub id: i64,
    pub user_id: i64,
}

impl From<PillBox> for BoxResponse {
    fn from(b: PillBox) -> Self {
        Self {
            id: b.id,
            user_id: b.user_id,
        }
    }
}

/// Rendered open or close event.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: i64,
    pub comp_id: i64,
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
}

impl From<OpenEvent> for EventResponse {
    fn from(e: OpenEvent) -> Self {
        Self {
            id: e.id,
            comp_id: e.comp_id,
            user_id: e.user_id,
            time: e.time,
        }
    }
}

impl From<CloseEvent> for EventResponse {
    fn from(e: CloseEvent) -> Self {
        Self {
            id: e.id,
            comp_id: e.comp_id,
            user_id: e.user_id,
            time: e.time,
        }
    }
}
