use std::path::PathBuf;

/// Common storage configuration shared by service binaries.
///
/// The binary resolves these from its config file and CLI flags, then
/// passes the resolved paths to storage layer initialization.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base directory for all persisted data.
    pub data_dir: Option<PathBuf>,

    /// Path to the SQLite database file.
    /// Defaults to `{data_dir}/data.sqlite` if not specified.
    pub sqlite_path: Option<PathBuf>,

    /// Directory for uploaded media (badge images).
    /// Defaults to `{data_dir}/media/` if not specified.
    pub media_dir: Option<PathBuf>,

    /// Listen address for the HTTP server.
    pub listen: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            sqlite_path: None,
            media_dir: None,
            listen: "0.0.0.0:8080".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Resolve the SQLite database path, falling back to `{data_dir}/data.sqlite`.
    pub fn resolve_sqlite_path(&self) -> PathBuf {
        self.sqlite_path
            .clone()
            .unwrap_or_else(|| self.resolve_data_subpath("data.sqlite"))
    }

    /// Resolve the media directory.
    pub fn resolve_media_dir(&self) -> PathBuf {
        self.media_dir
            .clone()
            .unwrap_or_else(|| self.resolve_data_subpath("media"))
    }

    fn resolve_data_subpath(&self, name: &str) -> PathBuf {
        self.data_dir
            .as_ref()
            .map(|d| d.join(name))
            .unwrap_or_else(|| PathBuf::from(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults() {
        let config = ServiceConfig {
            data_dir: Some(PathBuf::from("/data")),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_sqlite_path(),
            PathBuf::from("/data/data.sqlite")
        );
        assert_eq!(config.resolve_media_dir(), PathBuf::from("/data/media"));
    }

    #[test]
    fn test_explicit_paths_win() {
        let config = ServiceConfig {
            data_dir: Some(PathBuf::from("/data")),
            sqlite_path: Some(PathBuf::from("/elsewhere/reg.sqlite")),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_sqlite_path(),
            PathBuf::from("/elsewhere/reg.sqlite")
        );
    }
}
