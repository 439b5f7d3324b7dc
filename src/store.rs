//! Whole-document JSON persistence.
//!
//! Each feature owns one document that is read once at startup and rewritten
//! in full after every mutation. A missing or unreadable document yields the
//! type's default instead of failing startup.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Typed handle to one persisted JSON document.
#[derive(Debug, Clone)]
pub struct JsonStore<T> {
    path: PathBuf,
    _doc: PhantomData<fn() -> T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Bind a store to `path`. Nothing is read until [`JsonStore::load`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _doc: PhantomData,
        }
    }

    /// Location of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document, falling back to defaults when absent or malformed.
    pub fn load(&self) -> T {
        match self.try_load() {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                tracing::debug!("No document at {}, using defaults", self.path.display());
                T::default()
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable document: {e}");
                T::default()
            }
        }
    }

    /// Read the document, reporting parse failures to the caller.
    pub fn try_load(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs_err::read_to_string(&self.path).map_err(|e| Error::io(e, self.path.clone()))?;
        serde_json::from_str(&data)
            .map(Some)
            .map_err(|e| Error::parse(e.to_string(), self.path.clone()))
    }

    /// Replace the document on disk with `doc`.
    ///
    /// Writes a sibling temp file and renames it over the target so readers
    /// never observe a half-written document.
    pub fn save(&self, doc: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs_err::create_dir_all(parent).map_err(|e| Error::io(e, parent.to_path_buf()))?;
            }
        }
        let json = serde_json::to_string_pretty(doc)
            .map_err(|e| Error::Msg(format!("Failed to serialize {}: {e}", self.path.display())))?;
        let tmp = self.path.with_extension("json.tmp");
        fs_err::write(&tmp, json).map_err(|e| Error::io(e, tmp.clone()))?;
        fs_err::rename(&tmp, &self.path).map_err(|e| Error::io(e, self.path.clone()))?;
        Ok(())
    }
}
