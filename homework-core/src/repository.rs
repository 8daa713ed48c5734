//! JSON file store for homework records.
//!
//! Every operation reads the whole file, works on the in-memory list and
//! writes the whole file back. The sequence runs under an advisory lock on
//! a `<db_path>.lock` sidecar, so concurrent requests (or a CLI running next
//! to the server) cannot lose each other's writes.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::config::CalendarConfig;
use crate::error::{HomeworkError, HomeworkResult};
use crate::homework::{Homework, HomeworkFields};

/// On-disk shape: `{ "homeworks": [ ... ] }`
#[derive(Debug, Default, Serialize, Deserialize)]
struct HomeworkFile {
    homeworks: Vec<Homework>,
}

/// Lock held for the duration of one repository operation. Released on drop.
struct StoreLock {
    _file: File,
}

#[derive(Debug, Clone)]
pub struct HomeworkRepository {
    db_path: PathBuf,
}

impl HomeworkRepository {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        HomeworkRepository {
            db_path: db_path.into(),
        }
    }

    pub fn from_config(config: &CalendarConfig) -> Self {
        Self::new(config.db_path())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Create an empty database if none exists yet.
    /// Returns true if a file was created.
    pub fn init(&self) -> HomeworkResult<bool> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                storage_error(format!("failed to create {}", parent.display()), e)
            })?;
        }

        let _lock = self.lock_exclusive()?;
        if self.db_path.exists() {
            return Ok(false);
        }

        self.write(&HomeworkFile::default())?;
        tracing::info!(path = %self.db_path.display(), "created homework database");
        Ok(true)
    }

    /// All stored homeworks, in insertion order.
    ///
    /// Takes a shared lock on `<db_path>.lock`, creating that file if it is
    /// missing.
    pub fn list(&self) -> HomeworkResult<Vec<Homework>> {
        let _lock = self.lock_shared()?;
        Ok(self.read()?.homeworks)
    }

    /// Append a homework. The uid is not checked for duplicates.
    pub fn add(&self, homework: Homework) -> HomeworkResult<()> {
        tracing::debug!(uid = %homework.uid, "adding homework");
        self.modify(|homeworks| homeworks.push(homework))
    }

    /// Remove every homework with the given uid.
    /// Returns how many were removed; zero is not an error.
    pub fn remove(&self, uid: u128) -> HomeworkResult<usize> {
        let removed = self.modify(|homeworks| {
            let before = homeworks.len();
            homeworks.retain(|hw| hw.uid != uid);
            before - homeworks.len()
        })?;

        if removed == 0 {
            tracing::warn!(%uid, "remove matched no homework");
        } else {
            tracing::debug!(%uid, removed, "removed homework");
        }
        Ok(removed)
    }

    /// Overwrite the fields of every homework with the given uid.
    /// Returns how many were updated; zero is not an error.
    pub fn update(&self, uid: u128, fields: &HomeworkFields) -> HomeworkResult<usize> {
        let updated = self.modify(|homeworks| {
            let mut count = 0;
            for hw in homeworks.iter_mut().filter(|hw| hw.uid == uid) {
                hw.apply(fields);
                count += 1;
            }
            count
        })?;

        if updated == 0 {
            tracing::warn!(%uid, "update matched no homework");
        } else {
            tracing::debug!(%uid, updated, "updated homework");
        }
        Ok(updated)
    }

    /// Read, mutate and write back under an exclusive lock.
    /// The file is rewritten even when `f` changed nothing.
    fn modify<T>(&self, f: impl FnOnce(&mut Vec<Homework>) -> T) -> HomeworkResult<T> {
        let _lock = self.lock_exclusive()?;
        let mut file = self.read()?;
        let result = f(&mut file.homeworks);
        self.write(&file)?;
        Ok(result)
    }

    fn read(&self) -> HomeworkResult<HomeworkFile> {
        let content = fs::read_to_string(&self.db_path).map_err(|e| {
            storage_error(format!("failed to read {}", self.db_path.display()), e)
        })?;

        serde_json::from_str(&content).map_err(|e| {
            storage_error(format!("failed to parse {}", self.db_path.display()), e)
        })
    }

    fn write(&self, file: &HomeworkFile) -> HomeworkResult<()> {
        let content = serde_json::to_string_pretty(file)
            .map_err(|e| storage_error("failed to serialize homeworks".to_string(), e))?;

        fs::write(&self.db_path, content).map_err(|e| {
            storage_error(format!("failed to write {}", self.db_path.display()), e)
        })
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = OsString::from(self.db_path.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    fn open_lock_file(&self) -> HomeworkResult<File> {
        let path = self.lock_path();
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| storage_error(format!("failed to open lock {}", path.display()), e))
    }

    fn lock_exclusive(&self) -> HomeworkResult<StoreLock> {
        let file = self.open_lock_file()?;
        FileExt::lock_exclusive(&file)
            .map_err(|e| storage_error("failed to lock homework database".to_string(), e))?;
        Ok(StoreLock { _file: file })
    }

    fn lock_shared(&self) -> HomeworkResult<StoreLock> {
        let file = self.open_lock_file()?;
        FileExt::lock_shared(&file)
            .map_err(|e| storage_error("failed to lock homework database".to_string(), e))?;
        Ok(StoreLock { _file: file })
    }
}

fn storage_error(context: String, err: impl std::fmt::Display) -> HomeworkError {
    HomeworkError::Storage(format!("{}: {}", context, err))
}
