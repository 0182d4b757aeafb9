use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A dose time, RFC 3339 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOfDay(#[serde(with = "time::serde::rfc3339")] pub OffsetDateTime);

/// A medication schedule owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pill {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    /// ISO weekdays, 1 (Monday) through 7 (Sunday).
    pub days_of_week: BTreeSet<u8>,
    pub times_of_day: Vec<TimeOfDay>,
    pub archived: bool,
}
