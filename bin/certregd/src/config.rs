use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use registry::config::RegistryConfig;

/// Server configuration file (TOML).
///
/// ```toml
/// listen = "0.0.0.0:8080"
///
/// [storage]
/// data_dir = "/var/lib/certreg"
///
/// [registry]
/// required_certs = ["IC", "CBHC"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub listen: Option<String>,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Explicit SQLite path; defaults to `{data_dir}/data.sqlite`.
    #[serde(default)]
    pub sqlite_path: Option<String>,

    /// Directory badge files are dropped into; defaults to
    /// `{data_dir}/media`.
    #[serde(default)]
    pub media_dir: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            sqlite_path: None,
            media_dir: None,
        }
    }
}

fn default_data_dir() -> String {
    "/var/lib/certreg".to_string()
}

impl ServerConfig {
    /// A bare context name resolves to `/etc/certreg/<name>.toml`; a
    /// path (anything with `/` or `.`) is used directly.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from(format!("/etc/certreg/{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = toml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }
}
