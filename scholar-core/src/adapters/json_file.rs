//! JSON file store - one file per key in the data directory
//!
//! Each key maps to `<dir>/<key>.json`. Writes go to a temp file that is
//! renamed over the target, so a crash never leaves half a collection
//! behind. An `fs2` lock on `<dir>/.records.lock` serializes writers from
//! separate processes; the last writer still wins.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::domain::result::{Error, Result};
use crate::ports::KeyValueStore;

const LOCK_FILE: &str = ".records.lock";

pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    ///
    /// Keys are logical collection names; anything that could escape the
    /// directory is refused.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
        if !valid {
            return Err(Error::storage(format!("Invalid record key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    fn open_lock(&self) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(LOCK_FILE))?;
        Ok(file)
    }
}

impl KeyValueStore for JsonFileStore {
    fn name(&self) -> &str {
        "json"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let lock = self.open_lock()?;
        FileExt::lock_shared(&lock)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(content))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp_path = path.with_extension("json.tmp");

        let lock = self.open_lock()?;
        FileExt::lock_exclusive(&lock)?;

        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(value.as_bytes())?;
        tmp.sync_all()?;
        drop(tmp);

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;

        let lock = self.open_lock()?;
        FileExt::lock_exclusive(&lock)?;

        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}
