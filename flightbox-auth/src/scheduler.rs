//! Proactive refresh task.

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, warn};

use crate::credential::{Credential, RefreshTrigger};
use crate::manager::Inner;

/// Renews the credential `margin` before it expires.
///
/// Re-arms on every credential change. Attempts are spaced at least
/// `min_interval` apart. After a failed attempt the task idles until the
/// credential changes, since reactive callers retry on their own. Exits once
/// the credential is cleared or the manager is gone.
pub(crate) async fn run(
    manager: Weak<Inner>,
    mut updates: watch::Receiver<Option<Credential>>,
    margin: Duration,
    min_interval: Duration,
) {
    let mut last_attempt: Option<Instant> = None;

    loop {
        let Some(credential) = updates.borrow_and_update().clone() else {
            debug!("No credential held, scheduler stopping");
            return;
        };

        let due = credential.refresh_at(margin);
        // No deadline when the interval cannot be represented: wait for a change.
        let deadline = match last_attempt {
            Some(last_attempt) => last_attempt
                .checked_add(min_interval)
                .map(|earliest| due.max(earliest)),
            None => Some(due),
        };

        let wait = async move {
            match deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = wait => {}
            changed = updates.changed() => {
                if changed.is_err() {
                    return;
                }
                continue;
            }
        }

        let Some(inner) = manager.upgrade() else {
            return;
        };
        last_attempt = Some(Instant::now());
        let result = inner
            .refresh(RefreshTrigger::Proactive, credential.generation())
            .await;
        drop(inner);

        if let Err(err) = result {
            warn!(error = %err, "Proactive token refresh failed");
            if updates.changed().await.is_err() {
                return;
            }
        }
    }
}
