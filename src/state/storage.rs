use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::data::Artwork;
use super::error::{DecodeError, LoadError, StorageError};

/// Well-known key the collection is stored under
pub const ARTWORKS_KEY: &str = "customArtworks";

/// A local key-value mechanism holding opaque text values.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Key-value store backed by a single SQLite table.
///
/// The database file lives in the user's data directory by default:
/// - Linux: ~/.local/share/artwork-gallery/gallery.db
/// - macOS: ~/Library/Application Support/artwork-gallery/gallery.db
/// - Windows: %APPDATA%\artwork-gallery\gallery.db
pub struct SqliteStore {
    conn: Connection,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path` and make sure the table exists.
    pub fn open(db_path: &Path) -> Result<Self, StorageError> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        info!(path = %db_path.display(), "storage opened");

        let store = SqliteStore {
            conn,
            db_path: db_path.to_path_buf(),
        };
        store.init_schema()?;

        Ok(store)
    }

    /// Create the key-value table if it doesn't exist.
    fn init_schema(&self) -> Result<(), StorageError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS local_storage (
                key             TEXT PRIMARY KEY NOT NULL,
                value           TEXT NOT NULL
            )",
            [],
        )?;

        debug!("storage schema initialized");
        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO local_storage (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .finish()
    }
}

/// Saves and loads the whole artwork collection as one JSON blob.
///
/// An empty collection is stored as the absence of the key, so "never saved"
/// and "saved empty" load the same way.
#[derive(Debug)]
pub struct ArtworkStorage<S> {
    backend: S,
}

impl<S: KeyValueStore> ArtworkStorage<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Replace the stored collection with `artworks`.
    pub fn save(&mut self, artworks: &[Artwork]) -> Result<(), StorageError> {
        if artworks.is_empty() {
            self.backend.remove(ARTWORKS_KEY)?;
            debug!("collection empty, stored entry removed");
            return Ok(());
        }

        let json = serde_json::to_string(artworks)?;
        self.backend.set(ARTWORKS_KEY, &json)?;
        debug!(count = artworks.len(), bytes = json.len(), "collection saved");
        Ok(())
    }

    /// Read the stored collection; a missing or blank entry is an empty collection.
    pub fn load(&self) -> Result<Vec<Artwork>, LoadError> {
        let Some(json) = self.backend.get(ARTWORKS_KEY)? else {
            return Ok(Vec::new());
        };
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&json).map_err(|source| {
            LoadError::Decode(DecodeError {
                key: ARTWORKS_KEY.to_string(),
                source,
            })
        })
    }

    /// Drop whatever is stored, readable or not
    pub fn discard(&mut self) -> Result<(), StorageError> {
        self.backend.remove(ARTWORKS_KEY)
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    #[cfg(test)]
    pub(crate) fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }
}
