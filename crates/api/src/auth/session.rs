//! The session context: which admins are signed in right now.
//!
//! One entry per open session, keyed by session id. Entries are added by
//! [`SessionContext::login`], removed by [`SessionContext::logout`], and
//! dropped when the identity provider reports that a session ended
//! elsewhere (see [`SessionContext::start_sync`]) or once they expire
//! (see [`SessionContext::prune_expired`]).

use std::collections::HashMap;
use std::sync::Arc;

use atelier_core::error::CoreError;
use atelier_core::session::{SessionEvent, SessionPhase};
use atelier_core::types::{DocId, Timestamp};
use atelier_db::models::admin::Admin;
use atelier_db::models::Record;
use atelier_db::Facade;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;

use super::identity::{IdentityProvider, SessionChange, SignIn};
use crate::error::{AppError, AppResult};
use crate::ws::WsManager;

/// An open admin session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionEntry {
    pub session_id: String,
    pub uid: String,
    pub email: String,
    /// Id of the matching `admins` document.
    pub admin_id: DocId,
    pub admin_name: String,
    pub role: String,
    pub phase: SessionPhase,
    pub started_at: Timestamp,
    /// When the session token stops verifying.
    pub expires_at: Timestamp,
}

#[derive(Default)]
pub struct SessionContext {
    entries: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sign in through the identity provider and admit the identity only if
    /// an `admins` document carries its email.
    ///
    /// Wrong credentials are `Unauthorized`; a valid identity that is not an
    /// admin is `Forbidden` and its provider session is closed again.
    pub async fn login(
        &self,
        identity: &dyn IdentityProvider,
        facade: &Facade,
        email: &str,
        password: &str,
    ) -> AppResult<(SignIn, Record<Admin>)> {
        let phase = SessionPhase::Anonymous.transition(SessionEvent::Begin)?;

        let signed_in = match identity.sign_in(email, password).await {
            Ok(s) => s,
            Err(e) => {
                phase.transition(SessionEvent::Fail)?;
                tracing::info!(email = %email.trim(), "Sign-in rejected");
                return Err(e.into());
            }
        };

        let admin = match facade.find_by::<Admin>("email", signed_in.email.as_str()).await {
            Ok(Some(admin)) => admin,
            Ok(None) => {
                phase.transition(SessionEvent::Fail)?;
                identity.sign_out(&signed_in.session_id).await?;
                tracing::warn!(email = %signed_in.email, "Sign-in by non-admin identity");
                return Err(AppError::Core(CoreError::Forbidden(
                    "This account has not been granted admin access".into(),
                )));
            }
            Err(e) => {
                phase.transition(SessionEvent::Fail)?;
                identity.sign_out(&signed_in.session_id).await?;
                return Err(e.into());
            }
        };

        let now = chrono::Utc::now();
        let entry = SessionEntry {
            session_id: signed_in.session_id.clone(),
            uid: signed_in.uid.clone(),
            email: signed_in.email.clone(),
            admin_id: admin.id.clone(),
            admin_name: admin.data.name.clone(),
            role: admin.data.role.clone(),
            phase: phase.transition(SessionEvent::Succeed)?,
            started_at: now,
            expires_at: now + chrono::Duration::seconds(signed_in.expires_in),
        };
        self.entries
            .write()
            .await
            .insert(entry.session_id.clone(), entry);

        tracing::info!(
            uid = %signed_in.uid,
            admin_id = %admin.id,
            role = %admin.data.role,
            "Admin signed in"
        );
        Ok((signed_in, admin))
    }

    /// End a session locally and at the provider.
    pub async fn logout(&self, identity: &dyn IdentityProvider, session_id: &str) -> AppResult<()> {
        self.end(session_id).await?;
        identity.sign_out(session_id).await?;
        Ok(())
    }

    /// The entry of an authenticated session.
    pub async fn get(&self, session_id: &str) -> Option<SessionEntry> {
        self.entries
            .read()
            .await
            .get(session_id)
            .filter(|e| e.phase.is_authenticated())
            .cloned()
    }

    pub async fn is_active(&self, session_id: &str) -> bool {
        self.get(session_id).await.is_some()
    }

    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Drop one session. Returns `false` if it was not known.
    async fn end(&self, session_id: &str) -> Result<bool, CoreError> {
        let mut entries = self.entries.write().await;
        match entries.remove(session_id) {
            Some(entry) => {
                entry.phase.transition(SessionEvent::End)?;
                tracing::info!(session_id, uid = %entry.uid, "Session ended");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drop every session of `uid`. Returns how many were dropped.
    async fn end_user(&self, uid: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.uid != uid);
        before - entries.len()
    }

    /// Drop every session that expired before `now`. Returns how many were
    /// dropped.
    pub async fn prune_expired(&self, now: Timestamp) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }

    /// Apply one provider notification.
    pub async fn apply(&self, change: &SessionChange) {
        match change {
            SessionChange::SignedIn { .. } => {}
            SessionChange::SignedOut { session_id, .. } => {
                if let Err(e) = self.end(session_id).await {
                    tracing::warn!(session_id, error = %e, "Could not end session");
                }
            }
            SessionChange::UserRevoked { uid } => {
                let dropped = self.end_user(uid).await;
                tracing::info!(uid, dropped, "Sessions invalidated by identity provider");
            }
        }
    }

    /// Spawn the task that keeps this context in sync with the provider.
    ///
    /// Ended sessions and revoked users also lose their open WebSocket
    /// subscriptions.
    pub fn start_sync(
        self: Arc<Self>,
        mut changes: broadcast::Receiver<SessionChange>,
        ws_manager: Arc<WsManager>,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("Session sync stopping");
                        break;
                    }
                    received = changes.recv() => match received {
                        Ok(change) => {
                            self.apply(&change).await;
                            match &change {
                                SessionChange::SignedOut { session_id, .. } => {
                                    ws_manager.close_session(session_id).await;
                                }
                                SessionChange::UserRevoked { uid } => {
                                    ws_manager.close_user(uid).await;
                                }
                                SessionChange::SignedIn { .. } => {}
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Session sync lagged behind the identity provider");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use atelier_db::MemoryStore;

    use super::*;
    use crate::auth::identity::LocalIdentityProvider;
    use crate::auth::jwt::JwtConfig;

    async fn setup() -> (LocalIdentityProvider, Facade) {
        let store: Arc<dyn atelier_db::DocumentStore> = Arc::new(MemoryStore::new());
        let facade = Facade::new(Arc::clone(&store));
        let idp = LocalIdentityProvider::new(
            store,
            JwtConfig {
                secret: "session-test-secret".into(),
                expiry_mins: 5,
            },
        );
        idp.sign_up("ada@example.com", "password123").await.unwrap();
        idp.sign_up("eve@example.com", "password123").await.unwrap();
        facade
            .create(&Admin {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                role: "admin".into(),
                uid: None,
            })
            .await
            .unwrap();
        (idp, facade)
    }

    #[tokio::test]
    async fn admins_get_a_session() {
        let (idp, facade) = setup().await;
        let ctx = SessionContext::new();

        let (signed_in, admin) = ctx
            .login(&idp, &facade, "ada@example.com", "password123")
            .await
            .unwrap();

        let entry = ctx.get(&signed_in.session_id).await.unwrap();
        assert_eq!(entry.admin_id, admin.id);
        assert_eq!(entry.phase, SessionPhase::Authenticated);
    }

    #[tokio::test]
    async fn non_admins_are_forbidden_and_signed_out() {
        let (idp, facade) = setup().await;
        let ctx = SessionContext::new();

        let err = ctx
            .login(&idp, &facade, "eve@example.com", "password123")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Core(CoreError::Forbidden(_))));
        assert_eq!(ctx.count().await, 0);
        assert_eq!(idp.session_count().await, 0);
    }

    #[tokio::test]
    async fn provider_revocation_drops_sessions() {
        let (idp, facade) = setup().await;
        let ctx = SessionContext::new();
        let (signed_in, _) = ctx
            .login(&idp, &facade, "ada@example.com", "password123")
            .await
            .unwrap();

        ctx.apply(&SessionChange::UserRevoked {
            uid: signed_in.uid.clone(),
        })
        .await;
        assert!(!ctx.is_active(&signed_in.session_id).await);
    }

    #[tokio::test]
    async fn expired_sessions_are_pruned() {
        let (idp, facade) = setup().await;
        let ctx = SessionContext::new();
        let (signed_in, _) = ctx
            .login(&idp, &facade, "ada@example.com", "password123")
            .await
            .unwrap();

        let entry = ctx.get(&signed_in.session_id).await.unwrap();
        assert_eq!(entry.expires_at - entry.started_at, chrono::Duration::minutes(5));

        assert_eq!(ctx.prune_expired(chrono::Utc::now()).await, 0);
        assert_eq!(ctx.prune_expired(entry.expires_at).await, 1);
        assert_eq!(ctx.count().await, 0);
    }

    #[tokio::test]
    async fn signed_out_sessions_lose_their_sockets() {
        let (idp, facade) = setup().await;
        let ctx = Arc::new(SessionContext::new());
        let ws_manager = Arc::new(WsManager::new());
        let cancel = CancellationToken::new();
        let sync = Arc::clone(&ctx).start_sync(
            idp.on_session_changed(),
            Arc::clone(&ws_manager),
            cancel.clone(),
        );

        let (signed_in, _) = ctx
            .login(&idp, &facade, "ada@example.com", "password123")
            .await
            .unwrap();
        let (other, _) = ctx
            .login(&idp, &facade, "ada@example.com", "password123")
            .await
            .unwrap();
        let owner = |session_id: &str| {
            Some(crate::ws::WsOwner {
                uid: signed_in.uid.clone(),
                session_id: session_id.to_string(),
            })
        };
        let mut closed = ws_manager.add("c1".into(), owner(&signed_in.session_id), None).await;
        let mut kept = ws_manager.add("c2".into(), owner(&other.session_id), None).await;

        ctx.logout(&idp, &signed_in.session_id).await.unwrap();

        let frame = tokio::time::timeout(std::time::Duration::from_secs(2), closed.recv())
            .await
            .expect("socket closed by the sync task");
        assert!(matches!(frame, Some(axum::extract::ws::Message::Close(None))));
        assert!(kept.try_recv().is_err());
        assert_eq!(ws_manager.connection_count().await, 1);

        cancel.cancel();
        sync.await.unwrap();
    }

    #[tokio::test]
    async fn logout_ends_the_session_everywhere() {
        let (idp, facade) = setup().await;
        let ctx = SessionContext::new();
        let (signed_in, _) = ctx
            .login(&idp, &facade, "ada@example.com", "password123")
            .await
            .unwrap();

        ctx.logout(&idp, &signed_in.session_id).await.unwrap();
        assert!(!ctx.is_active(&signed_in.session_id).await);
        assert!(idp.verify(&signed_in.token).await.is_err());
    }
}
