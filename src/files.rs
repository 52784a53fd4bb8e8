//! Storage of uploaded documents.
//!
//! Routes hand the temporary upload to a [`FileStore`] and keep only the
//! returned reference; the workflow never reads file contents.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use actix_multipart::form::tempfile::TempFile;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("failed to store upload: {0}")]
    Io(#[from] io::Error),
    #[error("`{0}` is not a stored upload")]
    UnknownReference(String),
}

/// Persists uploaded files and returns stable references to them.
pub trait FileStore: Send + Sync {
    fn store(
        &self,
        hub_id: i32,
        original_name: Option<&str>,
        source: &Path,
    ) -> Result<String, FileStoreError>;

    /// Remove a file previously returned by [`FileStore::store`].
    fn discard(&self, reference: &str) -> Result<(), FileStoreError>;
}

/// Keeps uploads on local disk under `root/{hub_id}/`.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
    public_prefix: String,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }
}

impl FileStore for LocalFileStore {
    fn store(
        &self,
        hub_id: i32,
        original_name: Option<&str>,
        source: &Path,
    ) -> Result<String, FileStoreError> {
        let directory = self.root.join(hub_id.to_string());
        fs::create_dir_all(&directory)?;

        let file_name = stored_file_name(original_name);
        fs::copy(source, directory.join(&file_name))?;

        Ok(format!("{}/{hub_id}/{file_name}", self.public_prefix))
    }

    fn discard(&self, reference: &str) -> Result<(), FileStoreError> {
        let unknown = || FileStoreError::UnknownReference(reference.to_string());
        let relative = Path::new(
            reference
                .strip_prefix(self.public_prefix.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .ok_or_else(unknown)?,
        );
        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(unknown());
        }

        match fs::remove_file(self.root.join(relative)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Unique on-disk name that keeps a sanitized form of the original name.
fn stored_file_name(original_name: Option<&str>) -> String {
    let id = Uuid::new_v4().simple();
    let cleaned: String = original_name
        .and_then(|name| Path::new(name).file_name())
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.');

    if cleaned.is_empty() {
        id.to_string()
    } else {
        format!("{id}-{cleaned}")
    }
}

/// Store every non-empty upload of a multipart field.
///
/// Nothing is left behind when one of the uploads fails.
pub fn store_uploads(
    store: &dyn FileStore,
    hub_id: i32,
    uploads: &[TempFile],
) -> Result<Vec<String>, FileStoreError> {
    let mut stored = Vec::with_capacity(uploads.len());
    for upload in uploads.iter().filter(|upload| upload.size > 0) {
        match store.store(hub_id, upload.file_name.as_deref(), upload.file.path()) {
            Ok(reference) => stored.push(reference),
            Err(err) => {
                discard_uploads(store, &stored);
                return Err(err);
            }
        }
    }
    Ok(stored)
}

/// Remove stored uploads, logging the ones that could not be removed.
pub fn discard_uploads(store: &dyn FileStore, references: &[String]) {
    for reference in references {
        if let Err(err) = store.discard(reference) {
            log::warn!("Failed to remove upload {reference}: {err}");
        }
    }
}

/// Store `uploads` and hand their references to `apply`.
///
/// The files are removed again when `apply` fails, so a rejected request
/// leaves nothing in the store.
pub fn with_stored_uploads<T, E>(
    store: &dyn FileStore,
    hub_id: i32,
    uploads: &[TempFile],
    apply: impl FnOnce(Vec<String>) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<FileStoreError>,
{
    let stored = store_uploads(store, hub_id, uploads)?;
    let result = apply(stored.clone());
    if result.is_err() {
        discard_uploads(store, &stored);
    }
    result
}
