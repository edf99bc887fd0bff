//! Centralized configuration for restbase.
//!
//! Defaults for the HTTP listener, the document store and logging.

/// HTTP server defaults.
pub struct ServerConfig;

impl ServerConfig {
    pub const DEFAULT_HOST: &'static str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8000;
    pub const DEFAULT_WORKERS: usize = 2;
    pub const LANDING_MESSAGE: &'static str = "Server is up and running!";
    /// Route segments that can never be used as resource names.
    pub const RESERVED_ROUTES: [&'static str; 3] = ["echo", "testDB", "resetDB"];
}

/// Document store configuration.
pub struct StoreConfig;

impl StoreConfig {
    pub const ITEMS_PER_PAGE: u64 = 10;
    pub const DATABASE_NAME: &'static str = "mongoDatabase";
    pub const DATABASE_EXTENSION: &'static str = "sqlite3";
    pub const DATA_DIR_NAME: &'static str = "data";
    pub const DEFAULT_RESOURCES_PATH: &'static str = "/config/resources.json";
    pub const SELF_TEST_COLLECTION: &'static str = "test";

    /// Default on-disk location of the database, relative to the working directory.
    pub fn default_database_path() -> std::path::PathBuf {
        std::path::Path::new(Self::DATA_DIR_NAME)
            .join(format!("{}.{}", Self::DATABASE_NAME, Self::DATABASE_EXTENSION))
    }
}

/// Logging configuration.
pub struct LogConfig;

impl LogConfig {
    pub const LOG_LEVEL_ENV: &'static str = "LOGLEVEL";
    pub const DEFAULT_LEVEL: &'static str = "INFO";

    /// Translate a level name into a `tracing` filter directive.
    ///
    /// Accepts the usual tracing names plus `WARNING`, `CRITICAL` and `FATAL`.
    /// Unknown names fall back to `info`.
    pub fn filter_directive(level: &str) -> &'static str {
        match level.trim().to_ascii_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" | "warning" => "warn",
            "error" | "critical" | "fatal" => "error",
            "off" | "notset" => "off",
            _ => "info",
        }
    }
}
