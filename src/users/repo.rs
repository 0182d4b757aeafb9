use async_trait::async_trait;

use crate::users::repo_types::User;

/// User persistence. Lookups return `Ok(None)` when nothing matches;
/// `Err` is reserved for storage failures.
#[async_trait]
pub trait UserService: Send + Sync {
    async fn user_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;
    async fn user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn users(&self) -> anyhow::Result<Vec<User>>;
    /// Stores a new user and returns it with its assigned id.
    async fn insert_user(&self, user: User) -> anyhow::Result<User>;
    async fn update_user(&self, id: i64, user: User) -> anyhow::Result<()>;
}
