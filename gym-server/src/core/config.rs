//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Gym server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address for the HTTP listener
    pub http_host: String,
    pub http_port: u16,
    /// SQLite database file, shared with the card bridge
    pub database_path: String,
    /// Environment: development | staging | production
    pub environment: String,
    /// HMAC secret for session tokens
    pub session_secret: String,
    pub session_ttl_hours: i64,
    /// Directory holding the presentation pages
    pub web_dir: String,
    /// Admin account created by `GET /api/seed`
    pub admin_email: String,
    pub admin_password: Option<String>,
    /// Allow seeding outside development
    pub enable_seed: bool,
    pub log_level: String,
    /// Daily rolling log files go here when set
    pub log_dir: Option<String>,
    /// Relay channel URL handed to the attendance and intake pages
    pub relay_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_host: "0.0.0.0".into(),
            http_port: 3000,
            database_path: "data/gym.db".into(),
            environment: "development".into(),
            session_secret: "dev-SESSION_SECRET-not-for-production".into(),
            session_ttl_hours: 12,
            web_dir: "web".into(),
            admin_email: "admin@gym.local".into(),
            admin_password: None,
            enable_seed: false,
            log_level: "info".into(),
            log_dir: None,
            relay_url: "ws://localhost:4000".into(),
        }
    }
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let defaults = Self::default();
        let environment = std::env::var("ENVIRONMENT").unwrap_or(defaults.environment);
        let enable_seed = std::env::var("ENABLE_SEED")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let mut config = Self {
            http_host: std::env::var("HTTP_HOST").unwrap_or(defaults.http_host),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.http_port),
            database_path: std::env::var("DATABASE_PATH").unwrap_or(defaults.database_path),
            session_secret: Self::require_secret("SESSION_SECRET", &environment)?,
            session_ttl_hours: std::env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|h| h.parse().ok())
                .filter(|h| *h > 0)
                .unwrap_or(defaults.session_ttl_hours),
            web_dir: std::env::var("WEB_DIR").unwrap_or(defaults.web_dir),
            admin_email: std::env::var("ADMIN_EMAIL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.admin_email),
            admin_password: None,
            enable_seed,
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
            relay_url: std::env::var("RELAY_URL").unwrap_or(defaults.relay_url),
            environment,
        };

        if config.seed_enabled() {
            config.admin_password = Some(Self::require_secret(
                "ADMIN_PASSWORD",
                &config.environment,
            )?);
        }

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// `GET /api/seed` is always available in development
    pub fn seed_enabled(&self) -> bool {
        self.environment == "development" || self.enable_seed
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}
