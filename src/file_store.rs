//! File-backed key-value store.
//!
//! Values live under `.cache/<hash>/` where the hash identifies the content
//! source, one `<key>.json` file per key.

use recital_core::error::StorageError;
use recital_core::progress::KeyValueStore;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const CACHE_DIR: &str = ".cache";

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn for_source(source_id: &str) -> Self {
        Self::at(hash_dir(Path::new(CACHE_DIR), source_id))
    }

    pub fn at(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|ch| if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' { ch } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

pub fn hash_dir(root: &Path, source_id: &str) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(source_id.as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    root.join(hash)
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::Read {
                key: key.to_string(),
                reason: err.to_string(),
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let write_err = |err: std::io::Error| StorageError::Write {
            key: key.to_string(),
            reason: err.to_string(),
        };
        fs::create_dir_all(&self.dir).map_err(write_err)?;
        fs::write(self.path_for(key), value).map_err(write_err)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::Remove {
                key: key.to_string(),
                reason: err.to_string(),
            }),
        }
    }
}
