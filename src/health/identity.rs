// src/health/identity.rs
//
// Stable service identifier kept in a plain-text file across restarts.
use std::fs::OpenOptions;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of every generated service identifier.
pub const SERVICE_ID_PREFIX: &str = "api";

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("unable to open service file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("unable to read service file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("unable to write service file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

pub fn generate_service_id() -> String {
    format!("{}{}", SERVICE_ID_PREFIX, uuid::Uuid::new_v4().simple())
}

/// Return the identifier stored at `path`, creating and persisting a new
/// one when the file is missing or empty.
///
/// Existing content is returned verbatim, without any format check.
pub fn persistent_service_id(path: impl AsRef<Path>) -> Result<String, IdentityError> {
    let path = path.as_ref();
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(path)
        .map_err(|source| IdentityError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let mut buf = Vec::new();
    file.read_to_end(&mut buf)
        .map_err(|source| IdentityError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let service_id = if buf.is_empty() {
        let service_id = generate_service_id();
        file.write_all(service_id.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|source| IdentityError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        info!(%service_id, path = %path.display(), "Generated new persistent service-id");
        service_id
    } else {
        String::from_utf8(buf).map_err(|e| IdentityError::Read {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })?
    };

    info!(%service_id, "Using persistent service-id");
    Ok(service_id)
}
