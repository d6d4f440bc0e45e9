#[cfg(test)]
#[path = "file_test.rs"]
mod tests;

use std::fs;
use std::io;
use std::path;

use anyhow::Context;
use anyhow::Result;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Store;

/// One JSON document per key inside the state directory. Writes go to a
/// temporary sibling first and are renamed into place.
pub struct FileStore {
    dir: path::PathBuf,
}

impl Default for FileStore {
    fn default() -> FileStore {
        return FileStore::with_dir(path::PathBuf::from(Config::get(ConfigKey::StateDir)));
    }
}

impl FileStore {
    pub fn with_dir(dir: path::PathBuf) -> FileStore {
        return FileStore { dir };
    }

    fn path_for(&self, key: &str) -> path::PathBuf {
        return self.dir.join(format!("{key}.json"));
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let file_path = self.path_for(key);

        match fs::read_to_string(&file_path) {
            Ok(payload) => return Ok(Some(payload)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| {
                    return format!("Failed to read {}", file_path.display());
                });
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| return format!("Failed to create {}", self.dir.display()))?;

        let file_path = self.path_for(key);
        let tmp_path = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp_path, value)
            .with_context(|| return format!("Failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &file_path)
            .with_context(|| return format!("Failed to replace {}", file_path.display()))?;

        return Ok(());
    }

    fn remove(&self, key: &str) -> Result<()> {
        let file_path = self.path_for(key);

        match fs::remove_file(&file_path) {
            Ok(_) => return Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => {
                return Err(err).with_context(|| {
                    return format!("Failed to remove {}", file_path.display());
                });
            }
        }
    }
}
