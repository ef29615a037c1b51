//! # Kilroy FileSystem Storage
//!
//! A local filesystem backend for kilroy.
//!
//! This crate implements the [`StorageBackend`] trait over a plain file
//! hierarchy, so that `/thing/123.json` is literally
//! `<root>/immutable/thing/123.json` on disk.
//!
//! ## Features
//!
//! * **Atomic Writes**: Uses uniquely named temporary files and rename
//!   operations, so a reader never sees a partially uploaded resource.
//! * **Streaming Reads**: Files are streamed rather than loaded into memory.
//!
//! ## Usage
//!
//! ```no_run
//! use kilroy_fs::FileSystemStorage;
//!
//! let storage = FileSystemStorage::new("../db");
//! ```

use bytes::Bytes;
use futures::StreamExt;
use kilroy_core::prelude::*;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn tmp_path_for(path: &Path) -> PathBuf {
    let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.{n}.tmp", std::process::id()))
}

async fn atomic_write(path: &Path, data: Bytes) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let tmp_path = tmp_path_for(path);
    let result = match fs::write(&tmp_path, data).await {
        Ok(()) => fs::rename(&tmp_path, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        if let Err(cleanup) = fs::remove_file(&tmp_path).await {
            if cleanup.kind() != ErrorKind::NotFound {
                warn!("could not remove {}: {cleanup}", tmp_path.display());
            }
        }
        return Err(StorageError::Io(e));
    }

    Ok(())
}

#[derive(Clone, Debug)]
pub struct FileSystemStorage {
    root: PathBuf,
}

impl FileSystemStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { root: path.into() }
    }

    /// Where `resource` lives on disk.
    pub fn path_of(&self, resource: &Resource) -> PathBuf {
        self.root.join(resource.relative_path())
    }
}

impl StorageBackend for FileSystemStorage {
    async fn open(&self, resource: &Resource) -> Result<ResourceBody, StorageError> {
        let path = self.path_of(resource);
        let not_found = || StorageError::NotFound(resource.to_string());

        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(StorageError::Io(e)),
        };
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(not_found());
        }

        Ok(ResourceBody {
            len: metadata.len(),
            stream: ReaderStream::new(file).boxed(),
        })
    }

    async fn write(&self, resource: &Resource, data: Bytes) -> Result<bool, StorageError> {
        let path = self.path_of(resource);

        match resource.mutability() {
            Mutability::Mutable => {
                let existed = fs::try_exists(&path).await?;
                atomic_write(&path, data).await?;
                Ok(!existed)
            }
            Mutability::Immutable => match fs::read(&path).await {
                Ok(existing) if existing == data => {
                    debug!("{resource} already stored with identical content");
                    Ok(false)
                }
                Ok(_) => Err(StorageError::Conflict(resource.to_string())),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    atomic_write(&path, data).await?;
                    Ok(true)
                }
                Err(e) => Err(StorageError::Io(e)),
            },
        }
    }

    async fn delete(&self, resource: &Resource) -> Result<bool, StorageError> {
        match fs::remove_file(self.path_of(resource)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
