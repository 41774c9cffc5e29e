//! Token persistence in a small JSON file.
//!
//! The file holds a flat string map; the token lives under `TOKEN_KEY`.
//! Writes go to a temp file first and are renamed into place.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use book_core::{StorageError, TokenStore, TOKEN_KEY};

#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let bytes = fs::read(&self.path)
            .map_err(|e| StorageError::new(format!("read {}: {e}", self.path.display())))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| StorageError::new(format!("parse {}: {e}", self.path.display())))
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if map.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(StorageError::new(format!(
                    "remove {}: {e}",
                    self.path.display()
                ))),
            };
        }
        let bytes = serde_json::to_vec_pretty(map)
            .map_err(|e| StorageError::new(format!("serialize session: {e}")))?;
        write_atomic(&self.path, &bytes)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.read_map()?.remove(TOKEN_KEY))
    }

    fn save(&mut self, token: &str) -> Result<(), StorageError> {
        let mut map = self.read_map().unwrap_or_default();
        map.insert(TOKEN_KEY.to_string(), token.to_string());
        self.write_map(&map)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        let mut map = self.read_map().unwrap_or_default();
        map.remove(TOKEN_KEY);
        self.write_map(&map)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| StorageError::new(format!("create dir {}: {e}", parent.display())))?;
    }
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    fs::write(&tmp, bytes)
        .map_err(|e| StorageError::new(format!("write {}: {e}", tmp.display())))?;
    fs::rename(&tmp, path).map_err(|e| {
        StorageError::new(format!(
            "rename {} -> {}: {e}",
            tmp.display(),
            path.display()
        ))
    })
}
