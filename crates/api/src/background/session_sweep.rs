//! Periodic removal of expired sessions.
//!
//! Expired tokens already fail verification; the sweep frees their entries
//! in the identity provider and the session context and closes any sockets
//! still open under them.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::auth::identity::IdentityProvider;
use crate::auth::session::SessionContext;

/// Close expired sessions once. Returns how many provider sessions closed.
///
/// The provider announces each closure as a sign-out, which the session
/// sync task turns into socket closures. Context entries are pruned here
/// too so a lagging sync cannot leave them behind.
pub async fn sweep(identity: &dyn IdentityProvider, sessions: &SessionContext) -> usize {
    let now = chrono::Utc::now();
    let closed = match identity.close_expired(now).await {
        Ok(closed) => closed,
        Err(e) => {
            tracing::error!(error = %e, "Expired session sweep failed");
            0
        }
    };
    let pruned = sessions.prune_expired(now).await;
    if closed > 0 || pruned > 0 {
        tracing::info!(closed, pruned, "Expired sessions swept");
    }
    closed
}

/// Run the sweep loop until `cancel` is triggered.
pub async fn run(
    identity: Arc<dyn IdentityProvider>,
    sessions: Arc<SessionContext>,
    every: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = every.as_secs(), "Session sweep job started");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session sweep job stopping");
                break;
            }
            _ = interval.tick() => {
                sweep(identity.as_ref(), &sessions).await;
            }
        }
    }
}
