use async_trait::async_trait;

use crate::pills::repo_types::Pill;

#[async_trait]
pub trait PillService: Send + Sync {
    async fn pill(&self, id: i64) -> anyhow::Result<Option<Pill>>;
    async fn pills(&self, user_id: i64) -> anyhow::Result<Vec<Pill>>;
    /// Stores a new pill and returns it with its assigned id.
    async fn create_pill(&self, pill: Pill) -> anyhow::Result<Pill>;
    async fn update_pill(&self, id: i64, pill: Pill) -> anyhow::Result<()>;
}
