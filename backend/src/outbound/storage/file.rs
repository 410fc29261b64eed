//! File-backed cart storage.
//!
//! The snapshot lives in `<key>.json` inside a directory opened through
//! `cap-std`, so the adapter can only touch files beneath that directory.
//! Saves write a hidden temporary file and rename it over the target; a
//! crash mid-save leaves the previous snapshot intact.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};
use tracing::debug;

use crate::domain::CART_STORAGE_KEY;
use crate::domain::ports::{CartStorage, CartStorageError};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Stores the cart snapshot as a JSON file.
#[derive(Debug)]
pub struct FileCartStorage {
    dir: Dir,
    file_name: String,
}

impl FileCartStorage {
    /// Open (creating if needed) `path` and store the snapshot inside it.
    ///
    /// # Errors
    ///
    /// Returns [`CartStorageError::Unavailable`] when the directory cannot be
    /// created or opened.
    pub fn open(path: &Utf8Path) -> Result<Self, CartStorageError> {
        Dir::create_ambient_dir_all(path, ambient_authority())
            .and_then(|()| Dir::open_ambient_dir(path, ambient_authority()))
            .map(Self::in_dir)
            .map_err(|err| CartStorageError::unavailable(format!("{path}: {err}")))
    }

    /// Store the snapshot inside an already opened directory.
    pub fn in_dir(dir: Dir) -> Self {
        Self {
            dir,
            file_name: format!("{CART_STORAGE_KEY}.json"),
        }
    }

    /// Name of the snapshot file relative to the storage directory.
    pub fn file_name(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(&self.file_name)
    }

    fn write_atomic(&self, contents: &str) -> io::Result<()> {
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_nanos());
        let tmp_name = format!(
            ".{}.tmp.{}.{}.{}",
            self.file_name,
            std::process::id(),
            suffix,
            counter
        );

        self.write_temp_file(&tmp_name, contents)?;
        if let Err(err) = self.replace_target(&tmp_name) {
            drop(self.dir.remove_file(&tmp_name));
            return Err(err);
        }
        self.sync_directory();
        Ok(())
    }

    fn write_temp_file(&self, tmp_name: &str, contents: &str) -> io::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        let mut file = self.dir.open_with(tmp_name, &options)?;

        let written = file
            .write_all(contents.as_bytes())
            .and_then(|()| file.sync_all());
        if let Err(err) = written {
            drop(file);
            drop(self.dir.remove_file(tmp_name));
            return Err(err);
        }
        Ok(())
    }

    #[cfg(windows)]
    fn replace_target(&self, tmp_name: &str) -> io::Result<()> {
        // Rename fails on Windows when the target exists.
        match self.dir.remove_file(&self.file_name) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        self.dir.rename(tmp_name, &self.dir, &self.file_name)
    }

    #[cfg(not(windows))]
    fn replace_target(&self, tmp_name: &str) -> io::Result<()> {
        self.dir.rename(tmp_name, &self.dir, &self.file_name)
    }

    fn sync_directory(&self) {
        if let Err(err) = self.dir.open(".").and_then(|dir| dir.sync_all()) {
            debug!(error = %err, "cart storage directory sync skipped");
        }
    }
}

impl CartStorage for FileCartStorage {
    fn load(&self) -> Result<Option<String>, CartStorageError> {
        match self.dir.read_to_string(&self.file_name) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(CartStorageError::io(format!("{}: {err}", self.file_name))),
        }
    }

    fn save(&self, snapshot: &str) -> Result<(), CartStorageError> {
        self.write_atomic(snapshot)
            .map_err(|err| CartStorageError::io(format!("{}: {err}", self.file_name)))
    }

    fn clear(&self) -> Result<(), CartStorageError> {
        match self.dir.remove_file(&self.file_name) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(CartStorageError::io(format!("{}: {err}", self.file_name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> TempDir {
        tempfile::tempdir().expect("temp dir")
    }

    fn storage_in(temp_dir: &TempDir) -> FileCartStorage {
        let dir = Dir::open_ambient_dir(temp_dir.path(), ambient_authority()).expect("open dir");
        FileCartStorage::in_dir(dir)
    }

    #[rstest]
    fn load_returns_none_before_first_save(temp_dir: TempDir) {
        let storage = storage_in(&temp_dir);
        assert_eq!(storage.load().expect("load"), None);
    }

    #[rstest]
    fn save_writes_named_file_without_leftovers(temp_dir: TempDir) {
        let storage = storage_in(&temp_dir);
        storage.save(r#"{"items":[]}"#).expect("first save");
        storage.save(r#"{"items":[],"totalItems":0}"#).expect("second save");

        let names: Vec<String> = std::fs::read_dir(temp_dir.path())
            .expect("list dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["nextshop-cart.json".to_owned()]);
        assert_eq!(
            storage.load().expect("load").as_deref(),
            Some(r#"{"items":[],"totalItems":0}"#)
        );
    }

    #[rstest]
    fn clear_is_idempotent(temp_dir: TempDir) {
        let storage = storage_in(&temp_dir);
        storage.save("{}").expect("save");
        storage.clear().expect("clear");
        storage.clear().expect("clear absent file");
        assert_eq!(storage.load().expect("load"), None);
    }

    #[rstest]
    fn open_creates_missing_directories(temp_dir: TempDir) {
        let nested = temp_dir.path().join("state").join("cart");
        let nested = Utf8PathBuf::from_path_buf(nested).expect("utf-8 temp path");
        let storage = FileCartStorage::open(&nested).expect("open nested");
        storage.save("{}").expect("save");
        assert!(nested.join(storage.file_name()).exists());
    }
}
