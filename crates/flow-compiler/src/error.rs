use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompilationError {
    #[error("pipeline `{0}` has not been validated; build it with GraphBuilder::build")]
    Unvalidated(String),
    #[error("invalid pipeline graph: {0}")]
    Invalid(String),
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
