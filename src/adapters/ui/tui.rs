//! Implements InputPort. Inquire-based confirmation before a paid scoring pass.

use crate::domain::DomainError;
use crate::ports::InputPort;
use async_trait::async_trait;
use inquire::Confirm;

/// Asks the operator on the terminal.
pub struct TuiInputPort;

#[async_trait]
impl InputPort for TuiInputPort {
    async fn confirm_scoring(&self, pending: usize, model: &str) -> Result<bool, DomainError> {
        let question = format!(
            "Score {} conversations with {}? This calls the paid API once per conversation.",
            pending, model
        );
        tokio::task::spawn_blocking(move || {
            Confirm::new(&question)
                .with_default(true)
                .prompt()
                .map_err(|e| DomainError::Input(e.to_string()))
        })
        .await
        .map_err(|e| DomainError::Input(e.to_string()))?
    }
}

/// Always answers yes (CONVO_RANK_ASSUME_YES=true, CI, tests).
pub struct AutoConfirm;

#[async_trait]
impl InputPort for AutoConfirm {
    async fn confirm_scoring(&self, _pending: usize, _model: &str) -> Result<bool, DomainError> {
        Ok(true)
    }
}
