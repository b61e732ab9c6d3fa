use clap::{Args, Parser, ValueEnum};

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub auth: AuthConfig,

    #[command(flatten)]
    pub cookies: CookieConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "LECTERN_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "LECTERN_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Per-request timeout in seconds
    #[arg(long, env = "LECTERN_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[arg(long, env = "LECTERN_DATABASE_URL")]
    pub url: String,

    /// Maximum number of pooled connections
    #[arg(long, env = "LECTERN_DB_MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: u32,

    /// Minimum number of pooled connections kept alive
    #[arg(long, env = "LECTERN_DB_MIN_CONNECTIONS", default_value_t = 1)]
    pub min_connections: u32,

    /// Timeout for acquiring a connection from the pool, in seconds
    #[arg(long, env = "LECTERN_DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub acquire_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct AuthConfig {
    /// Secret key for signing access tokens (at least 32 bytes)
    #[arg(long, env = "LECTERN_ACCESS_TOKEN_SECRET")]
    pub access_secret: String,

    /// Secret key for signing refresh tokens (at least 32 bytes)
    #[arg(long, env = "LECTERN_REFRESH_TOKEN_SECRET")]
    pub refresh_secret: String,

    /// Access token time-to-live (`ms`, `s`, `m`, `h` or `d` suffix; bare numbers are seconds)
    #[arg(long, env = "LECTERN_ACCESS_TOKEN_TTL", default_value = "15m")]
    pub access_ttl: String,

    /// Refresh token time-to-live (same grammar as the access TTL)
    #[arg(long, env = "LECTERN_REFRESH_TOKEN_TTL", default_value = "7d")]
    pub refresh_ttl: String,
}

#[derive(Clone, Debug, Args)]
pub struct CookieConfig {
    /// Set the Secure attribute on the refresh cookie (enable in production)
    #[arg(long, env = "LECTERN_COOKIE_SECURE", default_value_t = false)]
    pub secure: bool,

    /// SameSite policy for the refresh cookie
    #[arg(long, env = "LECTERN_COOKIE_SAMESITE", value_enum, default_value = "lax")]
    pub same_site: SameSitePolicy,

    /// Path the refresh cookie is scoped to
    #[arg(long, env = "LECTERN_COOKIE_PATH", default_value = "/auth")]
    pub path: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SameSitePolicy {
    Lax,
    Strict,
    None,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// OTLP endpoint for traces and metrics; export is disabled when unset
    #[arg(long, env = "LECTERN_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Log output format
    #[arg(long, env = "LECTERN_LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    pub fn load() -> Self {
        Self::parse()
    }
}
