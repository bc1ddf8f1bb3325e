//! Gallery configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Environment variable overriding the database location
pub const DB_PATH_ENV: &str = "GALLERY_DB_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a data directory; set GALLERY_DB_PATH")]
    NoDataDir,
}

/// Where the gallery keeps its state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryConfig {
    /// SQLite file backing the local key-value store
    pub db_path: PathBuf,
}

impl GalleryConfig {
    /// Load configuration from the environment (and `.env`, if present).
    ///
    /// | Env Var           | Default                                   |
    /// |-------------------|-------------------------------------------|
    /// | `GALLERY_DB_PATH` | `<data dir>/artwork-gallery/gallery.db`   |
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::resolve(
            std::env::var_os(DB_PATH_ENV).map(PathBuf::from),
            dirs::data_dir().or_else(dirs::home_dir),
        )
    }

    /// Pick the explicit path if set, else `gallery.db` under `data_dir`
    fn resolve(db_path: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Self, ConfigError> {
        let db_path = match db_path.filter(|p| !p.as_os_str().is_empty()) {
            Some(path) => path,
            None => {
                let mut path = data_dir.ok_or(ConfigError::NoDataDir)?;
                path.push("artwork-gallery");
                path.push("gallery.db");
                path
            }
        };
        Ok(Self { db_path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let config = GalleryConfig::resolve(
            Some(PathBuf::from("/tmp/g.db")),
            Some(PathBuf::from("/data")),
        )
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/g.db"));
    }

    #[test]
    fn test_empty_path_falls_back_to_data_dir() {
        let config = GalleryConfig::resolve(Some(PathBuf::new()), Some(PathBuf::from("/data"))).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/data/artwork-gallery/gallery.db"));

        let config = GalleryConfig::resolve(None, Some(PathBuf::from("/home/aji"))).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/home/aji/artwork-gallery/gallery.db"));
    }

    #[test]
    fn test_no_data_dir_is_an_error() {
        assert!(matches!(
            GalleryConfig::resolve(None, None),
            Err(ConfigError::NoDataDir)
        ));
    }
}
