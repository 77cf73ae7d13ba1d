// ⚙️ Configuration - flags, then environment, then local defaults

use clap::Parser;
use std::path::PathBuf;

pub const DB_ENV: &str = "USER_MIGRATION_DB";
pub const BIND_ENV: &str = "USER_MIGRATION_BIND";

pub const DEFAULT_DB_PATH: &str = "users.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Web server settings
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "user-migration-server",
    version,
    about = "Serve the user migration pages and API"
)]
pub struct ServerConfig {
    /// SQLite database holding the migrated entities
    #[arg(long = "db", env = DB_ENV, default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,

    /// Address the server listens on
    #[arg(long = "bind", env = BIND_ENV, default_value = DEFAULT_BIND_ADDR)]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_flags_override_everything() {
        let config = ServerConfig::try_parse_from([
            "user-migration-server",
            "--db",
            "/tmp/flag.db",
            "--bind",
            "127.0.0.1:8080",
        ])
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/flag.db"));
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
    }

    // Only this test touches the two variables
    #[test]
    fn test_env_then_defaults() {
        env::remove_var(DB_ENV);
        env::remove_var(BIND_ENV);
        let config = ServerConfig::try_parse_from(["user-migration-server"]).unwrap();
        assert_eq!(config, ServerConfig::default());

        env::set_var(DB_ENV, "/tmp/migrated.db");
        let config = ServerConfig::try_parse_from(["user-migration-server"]).unwrap();
        env::remove_var(DB_ENV);

        assert_eq!(config.db_path, PathBuf::from("/tmp/migrated.db"));
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
    }
}
