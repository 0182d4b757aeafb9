use async_trait::async_trait;

use crate::boxes::repo_types::{CloseEvent, OpenEvent, PillBox};

#[async_trait]
pub trait BoxService: Send + Sync {
    async fn box_by_id(&self, id: i64) -> anyhow::Result<Option<PillBox>>;
    async fn boxes(&self, user_id: i64) -> anyhow::Result<Vec<PillBox>>;
    /// Appends the event and returns it with its assigned id.
    async fn insert_open_event(&self, event: OpenEvent) -> anyhow::Result<OpenEvent>;
    async fn insert_close_event(&self, event: CloseEvent) -> anyhow::Result<CloseEvent>;
}
