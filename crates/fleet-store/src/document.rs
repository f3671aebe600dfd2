//! Reading and writing pretty-printed JSON documents

use fleet_core::{FleetError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// Read and parse `path`; `None` when the file does not exist.
pub(crate) async fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(FleetError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| FleetError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

/// Overwrite `path` with two-space indented JSON and a trailing newline,
/// creating parent directories as needed.
pub(crate) async fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut body = serde_json::to_string_pretty(value)?;
    body.push('\n');

    let io_err = |source| FleetError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    fs::write(path, body).await.map_err(io_err)
}
