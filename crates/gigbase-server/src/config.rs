use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: PathBuf,
    pub image_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let listen_addr = lookup("GIGBASE_LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("GIGBASE_LISTEN_ADDR", "must be a valid socket address")
            })?;

        let db_path = lookup("GIGBASE_DB_PATH")
            .unwrap_or_else(|| "./gigbase.redb".to_string())
            .into();

        let image_dir: PathBuf = lookup("GIGBASE_IMAGE_DIR")
            .unwrap_or_else(|| "./images".to_string())
            .into();
        if image_dir.as_os_str().is_empty() {
            return Err(ConfigError::Missing("GIGBASE_IMAGE_DIR"));
        }

        Ok(Config {
            listen_addr,
            db_path,
            image_dir,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, &'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(var) => {
                write!(f, "Missing required environment variable: {}", var)
            }
            ConfigError::Invalid(var, msg) => write!(f, "Invalid value for {}: {}", var, msg),
        }
    }
}

impl std::error::Error for ConfigError {}
