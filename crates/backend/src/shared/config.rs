use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub amazon: AmazonConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL used in links sent by email and WhatsApp
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            public_url: "http://localhost:3000".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for uploaded purchase order and invoice documents
    pub root: String,
    pub max_upload_mb: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: "target/storage".into(),
            max_upload_mb: 25,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AmazonConfig {
    /// Overrides the regional SP-API endpoint (sandbox, proxies)
    pub endpoint: Option<String>,
    pub default_marketplace: String,
}

impl Default for AmazonConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            default_marketplace: "US".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmailConfig {
    pub from_address: String,
    pub api_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from_address: "BDI Business Portal <noreply@bdibusinessportal.com>".into(),
            api_url: "https://api.resend.com/emails".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OpenAiConfig {
    pub translation_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            translation_model: "gpt-4o-mini".into(),
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[database]
path = "target/db/portal.db"

[server]
host = "0.0.0.0"
port = 3000
"#;

static CONFIG: OnceCell<Config> = OnceCell::new();

/// Load configuration from config.toml
///
/// Search order:
/// 1. Next to the executable
/// 2. Embedded default
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

/// Process-wide configuration, loaded once.
pub fn get() -> &'static Config {
    CONFIG.get_or_init(|| match load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Invalid config.toml, falling back to defaults: {}", e);
            default_config()
        }
    })
}

fn default_config() -> Config {
    Config {
        database: DatabaseConfig {
            path: "target/db/portal.db".into(),
        },
        server: ServerConfig::default(),
        storage: StorageConfig::default(),
        amazon: AmazonConfig::default(),
        email: EmailConfig::default(),
        openai: OpenAiConfig::default(),
    }
}

/// Resolves a configured path relative to the executable directory
fn resolve_path(raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return exe_dir.join(path);
        }
    }
    PathBuf::from(raw)
}

pub fn get_database_path(config: &Config) -> anyhow::Result<PathBuf> {
    Ok(resolve_path(&config.database.path))
}

pub fn get_storage_root(config: &Config) -> PathBuf {
    resolve_path(&config.storage.root)
}

/// Reads a secret from the environment; blank values count as missing.
pub fn env_secret(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config: Result<Config, _> = toml::from_str(DEFAULT_CONFIG);
        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config.database.path, "target/db/portal.db");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.max_upload_mb, 25);
        assert_eq!(config.openai.translation_model, "gpt-4o-mini");
    }

    #[test]
    fn partial_sections_use_defaults() {
        let config: Config = toml::from_str(
            r#"
            [database]
            path = "/var/lib/portal.db"

            [amazon]
            endpoint = "https://sandbox.sellingpartnerapi-na.amazon.com"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.amazon.endpoint.as_deref(),
            Some("https://sandbox.sellingpartnerapi-na.amazon.com")
        );
        assert_eq!(config.amazon.default_marketplace, "US");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(
            get_database_path(&config).unwrap(),
            PathBuf::from("/var/lib/portal.db")
        );
    }
}
