/// Asks the user to approve a destructive action.
#[async_trait::async_trait]
pub trait Confirmation: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}
