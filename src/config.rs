//! Application configuration read once from the environment.

use std::env;
use std::path::PathBuf;

use tracing::warn;

use crate::error::RuntimeError;

/// Environment variable holding the chat-platform credential.
pub const TOKEN_ENV: &str = "BOT_TOKEN";
/// Environment variable holding the document-database connection string.
pub const DATABASE_ENV: &str = "DATABASE_URL";
/// Environment variable overriding the persistent log directory.
pub const LOG_DIR_ENV: &str = "LOG_DIR";

/// Values the application reads at startup and never again.
///
/// The credential is a hard precondition: without it the process must exit
/// before entering supervision. The connection string may be absent, which
/// degrades the database-backed features but is not fatal.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Chat-platform credential.
    pub token: String,
    /// Document-database connection string, if configured.
    pub database_url: Option<String>,
    /// Directory receiving the persistent log file.
    pub log_dir: PathBuf,
}

impl AppConfig {
    /// Reads the configuration from the environment.
    ///
    /// A missing or empty credential is a
    /// [`RuntimeError::MissingEnv`]; a missing connection string only logs a
    /// warning.
    pub fn from_env() -> Result<Self, RuntimeError> {
        let token = match env::var(TOKEN_ENV) {
            Ok(v) if !v.trim().is_empty() => v,
            _ => return Err(RuntimeError::MissingEnv { name: TOKEN_ENV }),
        };

        let database_url = match env::var(DATABASE_ENV) {
            Ok(v) if !v.trim().is_empty() => Some(v),
            _ => {
                warn!(
                    var = DATABASE_ENV,
                    "no database connection string; database features disabled"
                );
                None
            }
        };

        let log_dir = env::var(LOG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("logs"));

        Ok(Self {
            token,
            database_url,
            log_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var tests mutate process state; keep them in one test so they
    // cannot race each other under the parallel test runner.
    #[test]
    fn from_env_requires_token_but_not_database() {
        unsafe {
            env::remove_var(TOKEN_ENV);
            env::remove_var(DATABASE_ENV);
            env::remove_var(LOG_DIR_ENV);
        }
        assert!(matches!(
            AppConfig::from_env(),
            Err(RuntimeError::MissingEnv { name }) if name == TOKEN_ENV
        ));

        unsafe { env::set_var(TOKEN_ENV, "  ") };
        assert!(AppConfig::from_env().is_err());

        unsafe { env::set_var(TOKEN_ENV, "secret") };
        let cfg = AppConfig::from_env().unwrap();
        assert_eq!(cfg.token, "secret");
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.log_dir, PathBuf::from("logs"));

        unsafe {
            env::set_var(DATABASE_ENV, "mongodb://localhost:27017/bot");
            env::set_var(LOG_DIR_ENV, "/var/log/bot");
        }
        let cfg = AppConfig::from_env().unwrap();
        assert_eq!(
            cfg.database_url.as_deref(),
            Some("mongodb://localhost:27017/bot")
        );
        assert_eq!(cfg.log_dir, PathBuf::from("/var/log/bot"));

        unsafe {
            env::remove_var(TOKEN_ENV);
            env::remove_var(DATABASE_ENV);
            env::remove_var(LOG_DIR_ENV);
        }
    }
}
