//! Application settings, read from an optional `settings.toml` and from
//! `CHECKIN__*` environment variables (e.g. `CHECKIN__SERVER__PORT=8080`).

use config::{
    Config, ConfigError, Environment, File,
    builder::{ConfigBuilder, DefaultState},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: String,
    pub port: u16,
    pub database: Database,
    /// Signs session cookies. At least 64 bytes.
    pub secret_key: String,
    pub session_ttl_hours: u32,
    /// Send the session cookie over HTTPS only.
    pub secure_cookie: bool,
}

/// First admin account, created only when the users table is empty.
#[derive(Debug, Deserialize)]
pub struct Bootstrap {
    pub admin_username: String,
    /// A random password is generated and logged when unset.
    pub admin_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub bootstrap: Bootstrap,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = with_defaults()?
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("CHECKIN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Every key except `server.secret_key` has a default.
fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("app.level", "info")?
        .set_default("server.bind", "127.0.0.1")?
        .set_default("server.port", 5000)?
        .set_default("server.database", "memory")?
        .set_default("server.session_ttl_hours", 12)?
        .set_default("server.secure_cookie", true)?
        .set_default("bootstrap.admin_username", "admin")
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    const EXAMPLE: &str = include_str!("../../../settings.example.toml");

    fn example() -> ConfigBuilder<DefaultState> {
        with_defaults()
            .unwrap()
            .add_source(File::from_str(EXAMPLE, FileFormat::Toml))
    }

    #[test]
    fn example_settings_require_a_secret_key() {
        let settings = example().build().unwrap();
        assert!(settings.try_deserialize::<Settings>().is_err());
    }

    #[test]
    fn example_settings_load_once_a_key_is_set() {
        let settings: Settings = example()
            .set_override("server.secret_key", "k".repeat(64))
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 5000);
        assert!(settings.server.secure_cookie);
        assert!(matches!(settings.server.database, Database::Sqlite(ref path) if path == "checkin.db"));
        assert_eq!(settings.bootstrap.admin_username, "admin");
        assert!(settings.bootstrap.admin_password.is_none());
    }
}
