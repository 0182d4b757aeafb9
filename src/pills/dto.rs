use std::collections::BTreeSet;

use axum::http::Extensions;
use serde::{Deserialize, Serialize};

use crate::{
    ctx::{ctx_value, Bind},
    error::ApiError,
    pills::repo_types::{Pill, TimeOfDay},
    users::repo_types::User,
};

/// Pill body for create and update. Zero ids mean "take it from the path".
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PillRequest {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub user_id: i64,
    pub name: String,
    #[serde(default)]
    pub days_of_week: BTreeSet<u8>,
    #[serde(default)]
    pub times_of_day: Vec<TimeOfDay>,
    #[serde(default)]
    pub archived: bool,
}

fn validate(pill: &Pill) -> Result<(), ApiError> {
    if pill.name.trim().is_empty() {
        return Err(ApiError::bad_request("name is required"));
    }
    if let Some(day) = pill.days_of_week.iter().find(|d| !(1..=7).contains(*d)) {
        return Err(ApiError::bad_request(format!(
            "day of week {day} is out of range 1-7"
        )));
    }
    Ok(())
}

impl PillRequest {
    /// Reconciles an update body with the pill and user resolved from the
    /// path; the body may not retarget either.
    pub fn into_update(self, current: &Pill, user: &User) -> Result<Pill, ApiError> {
        let id = if self.id == 0 { current.id } else { self.id };
        let user_id = if self.user_id == 0 { user.id } else { self.user_id };

        if id != current.id {
            return Err(ApiError::bad_request(
                "updated pill id must match the parameter pill id",
            ));
        }
        if user_id != user.id {
            return Err(ApiError::bad_request(
                "updated pill user id does not match parameter user id",
            ));
        }

        let pill = Pill {
            id,
            user_id,
            name: self.name,
            days_of_week: self.days_of_week,
            times_of_day: self.times_of_day,
            archived: self.archived,
        };
        validate(&pill)?;
        Ok(pill)
    }
}

impl Bind for PillRequest {
    type Target = Pill;

    fn bind(self, extensions: &Extensions) -> Result<Pill, ApiError> {
        let user = ctx_value::<User>(extensions)
            .ok_or_else(|| ApiError::internal_msg("missing request context"))?;

        if self.user_id != 0 && self.user_id != user.id {
            return Err(ApiError::bad_request(
                "pill user id should match the parameter user ID",
            ));
        }

        let pill = Pill {
            id: 0,
            user_id: user.id,
            name: self.name,
            days_of_week: self.days_of_week,
            times_of_day: self.times_of_day,
            archived: false,
        };
        validate(&pill)?;
        Ok(pill)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PillResponse {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub days_of_week: BTreeSet<u8>,
    pub times_of_day: Vec<TimeOfDay>,
    pub archived: bool,
}

impl From<Pill> for PillResponse {
    fn from(p: Pill) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            name: p.name,
            days_of_week: p.days_of_week,
            times_of_day: p.times_of_day,
            archived: p.archived,
        }
    }
}
