use async_trait::async_trait;

/// Credential checks backed by the user store.
#[async_trait]
pub trait AuthenticationService: Send + Sync {
    async fn authenticate(&self, email: &str, password: &str) -> anyhow::Result<bool>;
    async fn email_available(&self, email: &str) -> anyhow::Result<bool>;
}
