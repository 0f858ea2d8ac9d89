// Configuration module entry point
// Loads typed configuration from file, environment and defaults, and holds the
// shared application state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{Config, DatabaseConfig, ResourcesConfig};

/// Prefix of environment variables overriding configuration keys,
/// e.g. `CATALOG_SERVER__PORT=3000`
const ENV_PREFIX: &str = "CATALOG";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let builder = default_builder()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            );

        apply_legacy_env(builder)?.build()?.try_deserialize()
    }

    /// Configuration built from defaults alone
    #[cfg(test)]
    pub fn from_defaults() -> Result<Self, config::ConfigError> {
        default_builder()?.build()?.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

type Builder = config::ConfigBuilder<config::builder::DefaultState>;

fn default_builder() -> Result<Builder, config::ConfigError> {
    config::Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 3000)?
        .set_default("database.host", "localhost")?
        .set_default("database.port", 5432)?
        .set_default("database.user", "postgres")?
        .set_default("database.password", "")?
        .set_default("database.name", "eco_products")?
        .set_default("database.max_connections", 10)?
        .set_default("database.connect_timeout_secs", 5)?
        .set_default("database.statement_timeout_secs", 10)?
        .set_default("resources.template_dir", "templates")?
        .set_default("resources.public_dir", "public")?
        .set_default("logging.level", "info")?
        .set_default("logging.access_log", true)?
        .set_default("performance.keep_alive_timeout", 75)?
        .set_default("performance.read_timeout", 30)?
        .set_default("http.server_name", "catalog-server")?
        .set_default("http.max_body_size", 10_485_760) // 10MB
}

/// Conventional deployment variables take precedence over everything else
fn apply_legacy_env(builder: Builder) -> Result<Builder, config::ConfigError> {
    let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

    builder
        .set_override_option("database.url", var("DATABASE_URL"))?
        .set_override_option("database.host", var("DB_HOST"))?
        .set_override_option("database.port", var("DB_PORT"))?
        .set_override_option("database.user", var("DB_USER"))?
        .set_override_option("database.password", var("DB_PASSWORD"))?
        .set_override_option("database.name", var("DB_NAME"))?
        .set_override_option("server.port", var("PORT"))
}
