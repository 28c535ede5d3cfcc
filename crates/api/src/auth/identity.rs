//! The identity provider contract and its local adapter.
//!
//! The provider owns credentials and sessions. The admin console only asks
//! it to sign people in and out, verify tokens, and tell it when sessions
//! end, so a hosted provider can replace [`LocalIdentityProvider`] without
//! touching the handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use atelier_core::document::{Document, Fields, Filter, ListQuery};
use atelier_core::types::Timestamp;
use atelier_db::{DocumentStore, StoreError};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex, RwLock};

use super::jwt::{generate_token, validate_token, Claims, JwtConfig};
use super::password::{hash_password, verify_password};

/// Collection holding credential records of the local provider.
pub const IDENTITIES_COLLECTION: &str = "_identities";

/// Buffer of the session-change channel.
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account already exists for {0}")]
    EmailTaken(String),

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Identity provider error: {0}")]
    Internal(String),
}

/// Result of a successful sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct SignIn {
    pub uid: String,
    pub email: String,
    pub session_id: String,
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

/// Session lifecycle notifications pushed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    SignedIn { uid: String, session_id: String },
    SignedOut { uid: String, session_id: String },
    /// Every session of `uid` was invalidated.
    UserRevoked { uid: String },
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register credentials. Returns the new user id.
    async fn sign_up(&self, email: &str, password: &str) -> Result<String, IdentityError>;

    /// Check credentials and open a session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignIn, IdentityError>;

    /// Close one session. Returns `false` if it was not open.
    async fn sign_out(&self, session_id: &str) -> Result<bool, IdentityError>;

    /// Decode a token whose session is still open.
    async fn verify(&self, token: &str) -> Result<Claims, IdentityError>;

    /// Close every session of `uid`. Returns how many were closed.
    async fn revoke_user(&self, uid: &str) -> Result<usize, IdentityError>;

    /// Close every session whose token expired before `now`, announcing
    /// each as signed out. Returns how many were closed.
    async fn close_expired(&self, now: Timestamp) -> Result<usize, IdentityError>;

    /// Subscribe to session changes.
    fn on_session_changed(&self) -> broadcast::Receiver<SessionChange>;
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

struct OpenSession {
    uid: String,
    expires_at: Timestamp,
}

/// Argon2id credentials stored in the document store, HS256 session tokens,
/// and an in-process session table.
///
/// Sign-ups are serialized so two concurrent requests for one email cannot
/// both pass the uniqueness check.
pub struct LocalIdentityProvider {
    store: Arc<dyn DocumentStore>,
    jwt: JwtConfig,
    /// Open sessions by session id.
    sessions: RwLock<HashMap<String, OpenSession>>,
    sign_up_lock: Mutex<()>,
    events: broadcast::Sender<SessionChange>,
}

impl LocalIdentityProvider {
    pub fn new(store: Arc<dyn DocumentStore>, jwt: JwtConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            jwt,
            sessions: RwLock::new(HashMap::new()),
            sign_up_lock: Mutex::new(()),
            events,
        }
    }

    /// Number of open sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Document>, IdentityError> {
        let query = ListQuery::new().filter(Filter::eq("email", email)).limit(1);
        let mut docs = self.store.list(IDENTITIES_COLLECTION, &query).await?;
        Ok(docs.pop())
    }

    fn emit(&self, change: SessionChange) {
        // Err only means nobody is listening.
        let _ = self.events.send(change);
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<String, IdentityError> {
        let email = normalize_email(email);
        let _guard = self.sign_up_lock.lock().await;
        if self.find_by_email(&email).await?.is_some() {
            return Err(IdentityError::EmailTaken(email));
        }

        let password_hash =
            hash_password(password).map_err(|e| IdentityError::Internal(e.to_string()))?;

        let mut fields = Fields::new();
        fields.insert("email".into(), email.clone().into());
        fields.insert("password_hash".into(), password_hash.into());
        let doc = self.store.create(IDENTITIES_COLLECTION, fields).await?;

        tracing::info!(uid = %doc.id, email = %email, "Identity registered");
        Ok(doc.id)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignIn, IdentityError> {
        let email = normalize_email(email);
        let identity = self
            .find_by_email(&email)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        let hash = identity
            .str_field("password_hash")
            .ok_or_else(|| IdentityError::Internal(format!("identity {} has no hash", identity.id)))?;
        let valid =
            verify_password(password, hash).map_err(|e| IdentityError::Internal(e.to_string()))?;
        if !valid {
            return Err(IdentityError::InvalidCredentials);
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        let token = generate_token(&identity.id, &email, &session_id, &self.jwt)
            .map_err(|e| IdentityError::Internal(format!("Token generation error: {e}")))?;

        let expires_in = self.jwt.expiry_secs();
        self.sessions.write().await.insert(
            session_id.clone(),
            OpenSession {
                uid: identity.id.clone(),
                expires_at: chrono::Utc::now() + chrono::Duration::seconds(expires_in),
            },
        );
        self.emit(SessionChange::SignedIn {
            uid: identity.id.clone(),
            session_id: session_id.clone(),
        });

        Ok(SignIn {
            uid: identity.id,
            email,
            session_id,
            token,
            expires_in,
        })
    }

    async fn sign_out(&self, session_id: &str) -> Result<bool, IdentityError> {
        let removed = self.sessions.write().await.remove(session_id);
        match removed {
            Some(open) => {
                self.emit(SessionChange::SignedOut {
                    uid: open.uid,
                    session_id: session_id.to_string(),
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn verify(&self, token: &str) -> Result<Claims, IdentityError> {
        let claims = validate_token(token, &self.jwt).map_err(|_| IdentityError::InvalidToken)?;
        let sessions = self.sessions.read().await;
        match sessions.get(&claims.sid) {
            Some(open) if open.uid == claims.sub => Ok(claims),
            _ => Err(IdentityError::InvalidToken),
        }
    }

    async fn revoke_user(&self, uid: &str) -> Result<usize, IdentityError> {
        let closed = {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, open| open.uid != uid);
            before - sessions.len()
        };
        tracing::info!(uid, closed, "Identity sessions revoked");
        self.emit(SessionChange::UserRevoked {
            uid: uid.to_string(),
        });
        Ok(closed)
    }

    async fn close_expired(&self, now: Timestamp) -> Result<usize, IdentityError> {
        let expired: Vec<(String, String)> = {
            let mut sessions = self.sessions.write().await;
            let ids: Vec<String> = sessions
                .iter()
                .filter(|(_, open)| open.expires_at <= now)
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter()
                .filter_map(|id| sessions.remove(&id).map(|open| (id, open.uid)))
                .collect()
        };
        for (session_id, uid) in &expired {
            self.emit(SessionChange::SignedOut {
                uid: uid.clone(),
                session_id: session_id.clone(),
            });
        }
        if !expired.is_empty() {
            tracing::info!(closed = expired.len(), "Expired identity sessions closed");
        }
        Ok(expired.len())
    }

    fn on_session_changed(&self) -> broadcast::Receiver<SessionChange> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use atelier_db::MemoryStore;

    use super::*;

    fn provider() -> LocalIdentityProvider {
        LocalIdentityProvider::new(
            Arc::new(MemoryStore::new()),
            JwtConfig {
                secret: "identity-test-secret".into(),
                expiry_mins: 5,
            },
        )
    }

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let idp = provider();
        let uid = idp.sign_up(" Ada@Example.com ", "password123").await.unwrap();

        let session = idp.sign_in("ada@example.com", "password123").await.unwrap();
        assert_eq!(session.uid, uid);
        assert_eq!(session.email, "ada@example.com");
        assert_eq!(session.expires_in, 300);

        let claims = idp.verify(&session.token).await.unwrap();
        assert_eq!(claims.sid, session.session_id);
    }

    #[tokio::test]
    async fn duplicate_sign_up_is_rejected() {
        let idp = provider();
        idp.sign_up("ada@example.com", "password123").await.unwrap();
        assert_matches!(
            idp.sign_up("ADA@example.com", "password456").await,
            Err(IdentityError::EmailTaken(_))
        );
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let idp = provider();
        idp.sign_up("ada@example.com", "password123").await.unwrap();
        assert_matches!(
            idp.sign_in("ada@example.com", "nope").await,
            Err(IdentityError::InvalidCredentials)
        );
        assert_matches!(
            idp.sign_in("ghost@example.com", "password123").await,
            Err(IdentityError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn sign_out_invalidates_the_token() {
        let idp = provider();
        idp.sign_up("ada@example.com", "password123").await.unwrap();
        let session = idp.sign_in("ada@example.com", "password123").await.unwrap();
        let mut rx = idp.on_session_changed();

        assert!(idp.sign_out(&session.session_id).await.unwrap());
        assert!(!idp.sign_out(&session.session_id).await.unwrap());
        assert_matches!(idp.verify(&session.token).await, Err(IdentityError::InvalidToken));
        assert_matches!(rx.recv().await, Ok(SessionChange::SignedOut { .. }));
    }

    #[tokio::test]
    async fn concurrent_sign_ups_register_one_identity() {
        let idp = provider();
        let (a, b) = tokio::join!(
            idp.sign_up("ada@example.com", "password123"),
            idp.sign_up("Ada@Example.com", "password456"),
        );
        let failed = match (a, b) {
            (Ok(_), Err(e)) | (Err(e), Ok(_)) => e,
            other => panic!("expected exactly one sign-up to succeed, got {other:?}"),
        };
        assert_matches!(failed, IdentityError::EmailTaken(_));

        let query = ListQuery::new().filter(Filter::eq("email", "ada@example.com"));
        let docs = idp.store.list(IDENTITIES_COLLECTION, &query).await.unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn expired_sessions_are_closed_and_announced() {
        let idp = provider();
        idp.sign_up("ada@example.com", "password123").await.unwrap();
        let session = idp.sign_in("ada@example.com", "password123").await.unwrap();
        let mut rx = idp.on_session_changed();

        assert_eq!(idp.close_expired(chrono::Utc::now()).await.unwrap(), 0);
        assert!(idp.verify(&session.token).await.is_ok());

        let later = chrono::Utc::now() + chrono::Duration::minutes(6);
        assert_eq!(idp.close_expired(later).await.unwrap(), 1);
        assert_eq!(idp.session_count().await, 0);
        assert_matches!(
            rx.recv().await,
            Ok(SessionChange::SignedOut { session_id, .. }) if session_id == session.session_id
        );
    }

    #[tokio::test]
    async fn revoke_closes_every_session_of_the_user() {
        let idp = provider();
        let uid = idp.sign_up("ada@example.com", "password123").await.unwrap();
        idp.sign_up("grace@example.com", "password123").await.unwrap();

        let a = idp.sign_in("ada@example.com", "password123").await.unwrap();
        idp.sign_in("ada@example.com", "password123").await.unwrap();
        let g = idp.sign_in("grace@example.com", "password123").await.unwrap();

        assert_eq!(idp.revoke_user(&uid).await.unwrap(), 2);
        assert_matches!(idp.verify(&a.token).await, Err(IdentityError::InvalidToken));
        assert!(idp.verify(&g.token).await.is_ok());
        assert_eq!(idp.session_count().await, 1);
    }
}
