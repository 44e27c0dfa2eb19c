//! Inbound port. The CLI asks the operator before spending on the API.

use crate::domain::DomainError;

/// Input port: operator decisions the pipeline cannot make alone.
#[async_trait::async_trait]
pub trait InputPort: Send + Sync {
    /// Confirm a fresh (paid) scoring pass over `pending` conversations.
    async fn confirm_scoring(&self, pending: usize, model: &str) -> Result<bool, DomainError>;
}
