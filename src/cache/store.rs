//! Key-sharded JSON record store
//!
//! A record for key `k` with suffix `s` lives at `<root>/<k[0:2]>/<k><s>`.
//! Writes create the shard directory on demand and overwrite existing
//! records. Reading a key that was never written is not an error.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, SearchError};

/// Directory of one cache, sharded by the first two characters of each key
#[derive(Debug, Clone)]
pub struct ShardedStore {
    root: PathBuf,
}

impl ShardedStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the record `key` + `suffix`
    pub fn path_for(&self, key: &str, suffix: &str) -> Result<PathBuf> {
        let shard = key
            .get(..2)
            .filter(|shard| !shard.contains(['/', '\\', '.']))
            .ok_or_else(|| SearchError::InvalidKey(key.to_string()))?;
        if key.contains(['/', '\\']) {
            return Err(SearchError::InvalidKey(key.to_string()));
        }

        Ok(self.root.join(shard).join(format!("{}{}", key, suffix)))
    }

    pub fn exists(&self, key: &str, suffix: &str) -> bool {
        self.path_for(key, suffix)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// Serialize `value` as JSON into the record
    pub fn write_json<T: Serialize + ?Sized>(&self, key: &str, suffix: &str, value: &T) -> Result<()> {
        let path = self.path_for(key, suffix)?;
        create_parent(&path)?;

        let file = File::create(&path).map_err(|e| SearchError::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, value)
            .map_err(|e| SearchError::serialization(&path, e))?;
        writer.flush().map_err(|e| SearchError::io(&path, e))?;
        Ok(())
    }

    /// Read a JSON record back; `Ok(None)` if it was never written
    pub fn read_json<T: DeserializeOwned>(&self, key: &str, suffix: &str) -> Result<Option<T>> {
        let path = self.path_for(key, suffix)?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SearchError::io(&path, e)),
        };

        let value = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| SearchError::serialization(&path, e))?;
        Ok(Some(value))
    }

    /// Store raw bytes under the record
    pub fn write_bytes(&self, key: &str, suffix: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key, suffix)?;
        create_parent(&path)?;
        fs::write(&path, bytes).map_err(|e| SearchError::io(&path, e))
    }

    pub fn read_bytes(&self, key: &str, suffix: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key, suffix)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SearchError::io(&path, e)),
        }
    }

    /// Keys of every record with `suffix`, sorted
    pub fn keys_with_suffix(&self, suffix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();

        let shards = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(keys),
            Err(e) => return Err(SearchError::io(&self.root, e)),
        };

        for shard in shards {
            let shard = shard.map_err(|e| SearchError::io(&self.root, e))?;
            if !shard.path().is_dir() {
                continue;
            }

            let records = fs::read_dir(shard.path()).map_err(|e| SearchError::io(shard.path(), e))?;
            for record in records {
                let record = record.map_err(|e| SearchError::io(shard.path(), e))?;
                let name = record.file_name();
                if let Some(key) = name.to_str().and_then(|n| n.strip_suffix(suffix)) {
                    keys.push(key.to_string());
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SearchError::io(parent, e))?;
    }
    Ok(())
}
