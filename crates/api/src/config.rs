use std::path::PathBuf;

use crate::auth::jwt::JwtConfig;

/// Which [`DocumentStore`](atelier_db::DocumentStore) adapter to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres,
}

impl StoreBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "postgres" | "postgresql" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Anything other than `json` means pretty output.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }

    /// Read `LOG_FORMAT`.
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("LOG_FORMAT").unwrap_or_default())
    }
}

/// Credentials for the super admin created at startup.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub store_backend: StoreBackend,
    /// Required when `store_backend` is Postgres.
    pub database_url: Option<String>,
    /// Directory uploaded objects are written to.
    pub upload_dir: PathBuf,
    /// URL prefix uploaded objects are served from.
    pub upload_public_url: String,
    pub max_upload_bytes: u64,
    /// Dashboard snapshot refresh interval in seconds.
    pub dashboard_refresh_secs: u64,
    /// How often expired sessions are swept, in seconds.
    pub session_sweep_secs: u64,
    pub bootstrap_admin: Option<BootstrapAdmin>,
    pub log_format: LogFormat,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `HOST`                     | `0.0.0.0`               |
    /// | `PORT`                     | `3000`                  |
    /// | `CORS_ORIGINS`             | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                    |
    /// | `STORE_BACKEND`            | `memory`                |
    /// | `DATABASE_URL`             | required for `postgres` |
    /// | `UPLOAD_DIR`               | `./uploads`             |
    /// | `UPLOAD_PUBLIC_URL`        | `/uploads`              |
    /// | `MAX_UPLOAD_BYTES`         | `104857600`             |
    /// | `DASHBOARD_REFRESH_SECS`   | `30`                    |
    /// | `SESSION_SWEEP_SECS`       | `60`                    |
    /// | `BOOTSTRAP_ADMIN_EMAIL`    | unset                   |
    /// | `BOOTSTRAP_ADMIN_PASSWORD` | unset                   |
    /// | `LOG_FORMAT`               | `pretty`                |
    ///
    /// See [`JwtConfig::from_env`] for the token settings.
    ///
    /// # Panics
    ///
    /// Panics on malformed values and when `STORE_BACKEND=postgres` is set
    /// without `DATABASE_URL`.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let backend_raw = std::env::var("STORE_BACKEND").unwrap_or_else(|_| "memory".into());
        let store_backend = StoreBackend::parse(&backend_raw)
            .unwrap_or_else(|| panic!("STORE_BACKEND must be 'memory' or 'postgres', got '{backend_raw}'"));

        let database_url = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());
        assert!(
            store_backend != StoreBackend::Postgres || database_url.is_some(),
            "DATABASE_URL must be set when STORE_BACKEND=postgres"
        );

        let upload_dir =
            PathBuf::from(std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".into()));
        let upload_public_url =
            std::env::var("UPLOAD_PUBLIC_URL").unwrap_or_else(|_| "/uploads".into());

        let max_upload_bytes: u64 = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| "104857600".into())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid u64");

        let dashboard_refresh_secs: u64 = std::env::var("DASHBOARD_REFRESH_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("DASHBOARD_REFRESH_SECS must be a valid u64");
        assert!(dashboard_refresh_secs > 0, "DASHBOARD_REFRESH_SECS must be positive");

        let session_sweep_secs: u64 = std::env::var("SESSION_SWEEP_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("SESSION_SWEEP_SECS must be a valid u64");
        assert!(session_sweep_secs > 0, "SESSION_SWEEP_SECS must be positive");

        let bootstrap_admin = match (
            std::env::var("BOOTSTRAP_ADMIN_EMAIL"),
            std::env::var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) if !email.is_empty() && !password.is_empty() => {
                Some(BootstrapAdmin { email, password })
            }
            _ => None,
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            store_backend,
            database_url,
            upload_dir,
            upload_public_url,
            max_upload_bytes,
            dashboard_refresh_secs,
            session_sweep_secs,
            bootstrap_admin,
            log_format: LogFormat::from_env(),
            jwt: JwtConfig::from_env(),
        }
    }
}
