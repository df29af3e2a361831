use std::path::PathBuf;

use thiserror::Error;

/// Fallo al obtener el dataset del store remoto. Se recupera localmente con
/// la copia de respaldo; sólo es fatal si ésta tampoco está disponible.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("remote store unreachable: {0}")]
    Unreachable(String),
    #[error("`{path}` not found in `{repo}`")]
    NotFound { repo: String, path: String },
    #[error("access to `{0}` denied")]
    Unauthorized(String),
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed dataset: {0}")]
    Parse(String),
}
