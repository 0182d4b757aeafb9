use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A physical dispensing box owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PillBox {
    pub id: i64,
    pub user_id: i64,
}

/// A compartment was opened. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenEvent {
    pub id: i64,
    pub comp_id: i64,
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
}

/// A compartment was closed. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseEvent {
    pub id: i64,
    pub comp_id: i64,
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
}
