//! Flat files holding one json array each.
//!
//! Both the alarm and the note collections persist this way. Reads treat a
//! missing file as an empty collection; everything else is reported as a
//! [`StoreError`] and the callers decide whether to log it.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFile {
    path: PathBuf,
    pretty: bool,
}

impl JsonFile {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self {
            path,
            pretty: false,
        }
    }

    /// indent the written array, notes are meant to be human readable
    #[must_use]
    pub const fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read<T: DeserializeOwned>(&self) -> Result<Vec<T>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&contents).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    pub fn write<T: Serialize>(&self, items: &[T]) -> Result<(), StoreError> {
        let contents = if self.pretty {
            serde_json::to_string_pretty(items)
        } else {
            serde_json::to_string(items)
        }
        .map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        let io_error = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(&self.path, contents).map_err(io_error)
    }
}
