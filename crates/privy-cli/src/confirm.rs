//! Interactive confirmation for side-effecting tools

use async_trait::async_trait;
use dialoguer::Confirm;
use privy::ConfirmPolicy;

/// Asks on the terminal; anything but an explicit yes is a refusal
pub struct PromptConfirm;

#[async_trait]
impl ConfirmPolicy for PromptConfirm {
    async fn confirm(&self, capability: &str, description: &str) -> bool {
        let prompt = format!("\n{} wants to: {}. Proceed?", capability, description);
        let answer = tokio::task::spawn_blocking(move || {
            Confirm::new().with_prompt(prompt).default(false).interact()
        })
        .await;

        match answer {
            Ok(Ok(allowed)) => allowed,
            Ok(Err(e)) => {
                tracing::warn!("Confirmation prompt failed: {}", e);
                false
            }
            Err(e) => {
                tracing::warn!("Confirmation prompt aborted: {}", e);
                false
            }
        }
    }
}
