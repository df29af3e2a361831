use flow_core::{ParameterError, StageError, StoreError};
use flow_validator::StructuralValidationError;
use thiserror::Error;
use uuid::Uuid;

/// Rechazo de un documento o de una ejecución aislada de stage.
///
/// Los fallos de stage dentro de un run no llegan aquí: quedan como
/// `StageFailed` en el log del run.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("document rejected by structural validation: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Rejected(Vec<StructuralValidationError>),
    #[error("task `{task}` references component `{component}` that this runtime cannot execute")]
    UnknownComponent { task: String, component: String },
    #[error("component `{0}` does not match the contract of the registered stage")]
    ContractMismatch(String),
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error("stage `{task}` is missing input `{input}`")]
    MissingInput { task: String, input: String },
    #[error("stage `{task}` declares no input `{input}`")]
    UnexpectedInput { task: String, input: String },
    #[error("stage `{stage}` failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: StageError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("malformed document: {0}")]
    Document(String),
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("unknown run {0}")]
    UnknownRun(Uuid),
}
