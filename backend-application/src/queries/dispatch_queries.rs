use backend_domain::ports::DispatchQueue;
use backend_domain::DispatchIntent;

use crate::{AppError, AppState};

/// Intents awaiting delivery by the external notifier, oldest first.
pub async fn pending_intents(state: &AppState) -> Result<Vec<DispatchIntent>, AppError> {
    let mut intents = state.dispatch.pending().await?;
    intents.sort_by_key(|intent| intent.created_at);
    Ok(intents)
}
