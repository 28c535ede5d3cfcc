use std::sync::Arc;

use atelier_db::{DocumentStore, Facade, ObjectStore};

use crate::auth::identity::IdentityProvider;
use crate::auth::session::SessionContext;
use crate::background::dashboard_refresh::DashboardCache;
use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Typed access to the document store.
    pub facade: Facade,
    /// Photos, logos and videos.
    pub objects: Arc<dyn ObjectStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub sessions: Arc<SessionContext>,
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (chat subscriptions).
    pub ws_manager: Arc<WsManager>,
    /// Last dashboard snapshot computed by the refresh task.
    pub dashboard: Arc<DashboardCache>,
}

impl AppState {
    /// Wire the collaborators together with empty session, socket and
    /// dashboard state.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        objects: Arc<dyn ObjectStore>,
        identity: Arc<dyn IdentityProvider>,
        config: ServerConfig,
    ) -> Self {
        Self {
            facade: Facade::new(store),
            objects,
            identity,
            sessions: Arc::new(SessionContext::new()),
            config: Arc::new(config),
            ws_manager: Arc::new(WsManager::new()),
            dashboard: Arc::new(DashboardCache::new()),
        }
    }
}
