//! File-backed [`StateStore`] confined to one capability directory.

use crate::input_storage::{InputStorageError, InputStorageResult, StateStore, StorageScope};
use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::sync::Arc;

/// Persists each scope as one JSON document inside a directory.
///
/// Writes replace the whole document. The adapter only touches files named
/// `<scope>.json` inside the directory it was opened with.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    dir: Arc<Dir>,
}

impl FileStateStore {
    /// Wraps an already opened directory.
    #[must_use]
    pub fn new(dir: Dir) -> Self {
        Self { dir: Arc::new(dir) }
    }

    /// Opens (creating if needed) the directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`InputStorageError::Backend`] when the directory cannot be
    /// created or opened.
    pub fn open(path: &Utf8Path) -> InputStorageResult<Self> {
        Dir::create_ambient_dir_all(path, ambient_authority())
            .map_err(InputStorageError::backend)?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())
            .map_err(InputStorageError::backend)?;
        Ok(Self::new(dir))
    }

    async fn with_document<T, F>(&self, scope: StorageScope, update: F) -> InputStorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut BTreeMap<String, String>) -> (T, bool) + Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || {
            let file_name = format!("{scope}.json");
            let mut document = read_document(&dir, &file_name)?;
            let (result, changed) = update(&mut document);
            if changed {
                let encoded = serde_json::to_string_pretty(&document)
                    .map_err(InputStorageError::backend)?;
                dir.write(&file_name, encoded)
                    .map_err(InputStorageError::backend)?;
            }
            Ok(result)
        })
        .await
        .map_err(InputStorageError::backend)?
    }
}

fn read_document(dir: &Dir, file_name: &str) -> InputStorageResult<BTreeMap<String, String>> {
    match dir.read_to_string(file_name) {
        Ok(contents) => {
            serde_json::from_str(&contents).map_err(|err| InputStorageError::Corrupt {
                key: file_name.to_owned(),
                reason: err.to_string(),
            })
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(err) => Err(InputStorageError::backend(err)),
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get(&self, scope: StorageScope, key: &str) -> InputStorageResult<Option<String>> {
        let wanted = key.to_owned();
        self.with_document(scope, move |document| (document.get(&wanted).cloned(), false))
            .await
    }

    async fn store(
        &self,
        scope: StorageScope,
        key: &str,
        value: String,
    ) -> InputStorageResult<()> {
        let entry = key.to_owned();
        self.with_document(scope, move |document| {
            document.insert(entry, value);
            ((), true)
        })
        .await
    }

    async fn remove(&self, scope: StorageScope, key: &str) -> InputStorageResult<()> {
        let entry = key.to_owned();
        self.with_document(scope, move |document| {
            let removed = document.remove(&entry).is_some();
            ((), removed)
        })
        .await
    }
}
