//! Confirmation prompt with non-interactive fallback

use super::context::UiContext;
use crate::error::{BunchError, BunchResult};

/// Ask a yes/no question
///
/// `--yes` answers true. Without a terminal the default is returned.
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> BunchResult<bool> {
    if ctx.auto_yes() {
        return Ok(true);
    }
    if !ctx.can_prompt() {
        return Ok(default);
    }

    let message = message.to_string();
    tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message)
            .initial_value(default)
            .interact()
    })
    .await
    .map_err(|e| BunchError::Internal(format!("prompt task failed: {}", e)))?
    .map_err(|e| BunchError::io("reading confirmation", e))
}
