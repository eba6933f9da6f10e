use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Netris
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetrisConfig {
    /// Where listing documents are kept
    pub store: StoreConfig,
    /// Photo upload target
    pub media: MediaConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
    /// Defaults applied to submitted listings
    pub listings: ListingDefaults,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local, lost on exit
    Memory,
    /// Single JSON file guarded by a file lock
    Json,
    /// SQLite database (requires the `database` feature)
    Sqlite,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// JSON file path or SQLite URL, depending on the backend
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaConfig {
    /// Directory uploaded photos are written to
    pub directory: String,
    /// Prefix of the URLs handed back for uploaded photos
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Emit JSON lines instead of human-readable logs
    pub json_logs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ListingDefaults {
    /// Stored when a submitter leaves the phone number blank
    pub default_phone: String,
    /// Stored when a submitter leaves the operating days blank
    pub default_operating_days: String,
}

impl Default for ListingDefaults {
    fn default() -> Self {
        Self {
            default_phone: "Tidak punya HP".to_string(),
            default_operating_days: "Setiap Hari".to_string(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl Default for NetrisConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                backend: StoreBackend::Json,
                path: ".netris/tambal_ban.json".to_string(),
            },
            media: MediaConfig {
                directory: ".netris/media".to_string(),
                base_url: "file://.netris/media".to_string(),
            },
            observability: ObservabilityConfig::default(),
            listings: ListingDefaults::default(),
        }
    }
}

impl NetrisConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (netris.toml)
    /// 3. Environment variables (NETRIS__SECTION__KEY)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("netris.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&NetrisConfig::default())?);

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("NETRIS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<NetrisConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = NetrisConfig::load_env_file();
        NetrisConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static NetrisConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let config = config()?;
    tracing::info!(
        backend = ?config.store.backend,
        path = %config.store.path,
        "Configuration loaded successfully"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_listing_conventions() {
        let config = NetrisConfig::default();
        assert_eq!(config.listings.default_phone, "Tidak punya HP");
        assert_eq!(config.listings.default_operating_days, "Setiap Hari");
        assert_eq!(config.store.backend, StoreBackend::Json);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netris.toml");
        std::fs::write(
            &path,
            "[store]\nbackend = \"memory\"\npath = \"unused\"\n\n[observability]\nlog_level = \"debug\"\njson_logs = true\n",
        )
        .unwrap();

        let config = NetrisConfig::load_from(&path).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.observability.log_level, "debug");
        assert!(config.observability.json_logs);
        assert_eq!(config.listings, ListingDefaults::default());
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = NetrisConfig::default();
        config.media.base_url = "https://cdn.example/netris".to_string();
        config.save_to_file(&path).unwrap();

        let reloaded = NetrisConfig::load_from(&path).unwrap();
        assert_eq!(reloaded.media.base_url, "https://cdn.example/netris");
    }
}
