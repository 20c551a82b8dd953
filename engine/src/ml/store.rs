// JSON model files, one per key, in a single directory.
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::ModelStore;
use crate::error::{EngineError, Result};

/// Stores each model as `<dir>/<key>.json`.
///
/// Writes go to a temp file in the same directory which is then renamed over the
/// target, so a concurrent reader sees either the old model or the new one.
/// Concurrent saves to one key resolve as last-writer-wins.
#[derive(Debug, Clone)]
pub struct JsonFileModelStore {
    dir: PathBuf,
}

impl JsonFileModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonFileModelStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\'])
            && !key.starts_with('.');
        if !valid {
            return Err(EngineError::StoreError(format!("invalid model key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl<M> ModelStore<M> for JsonFileModelStore
where
    M: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn save(&self, model: &M, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let store_err = |what: &str, e: &dyn std::fmt::Display| {
            EngineError::StoreError(format!("{} '{}': {}", what, path.display(), e))
        };

        fs::create_dir_all(&self.dir).map_err(|e| store_err("Failed to create model directory for", &e))?;
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| store_err("Failed to create temp file for", &e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, model).map_err(|e| store_err("Failed to serialise model to", &e))?;
            writer.flush().map_err(|e| store_err("Failed to write", &e))?;
        }
        tmp.persist(&path).map_err(|e| store_err("Failed to replace", &e.error))?;

        info!(key, path = %path.display(), "Saved model");
        Ok(())
    }

    fn load(&self, key: &str) -> Result<M> {
        let path = self.path_for(key)?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EngineError::ModelNotFound(key.to_string()));
            }
            Err(e) => {
                return Err(EngineError::StoreError(format!("Failed to open '{}': {}", path.display(), e)));
            }
        };
        let model = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| EngineError::StoreError(format!("Corrupt model file '{}': {}", path.display(), e)))?;
        debug!(key, path = %path.display(), "Loaded model");
        Ok(model)
    }
}
