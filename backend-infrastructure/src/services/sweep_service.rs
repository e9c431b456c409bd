// Periodic sweeps
// Runs on its own task, independent of request handling; each alert is
// still transitioned under the shared per-alert guard.

use std::sync::Arc;

use tracing::error;

use backend_application::commands::sweep_commands;
use backend_application::AppState;
use backend_domain::CallerIdentity;

use crate::services::notifier_service::WebhookNotifier;

pub async fn schedule_sweeps(state: AppState, notifier: Option<Arc<WebhookNotifier>>) {
    let caller = CallerIdentity::system();
    let period = std::time::Duration::from_secs(state.config.sweep_interval_seconds.max(1));
    loop {
        tokio::time::sleep(period).await;

        if let Err(err) = sweep_commands::run_sla_sweep(&state, &caller).await {
            error!("SLA sweep failed: {}", err);
        }
        if let Err(err) = sweep_commands::run_expiry_sweep(&state, &caller).await {
            error!("expiry sweep failed: {}", err);
        }
        if let Some(notifier) = &notifier {
            notifier.deliver_pending(&state).await;
        }
    }
}
