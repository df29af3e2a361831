//! Errores del core: parámetros, grafo y fallos de stage.

use thiserror::Error;

use crate::model::{ArtifactDecodeError, ArtifactKind, StoreError};

/// Parámetro ausente, desconocido o fuera de dominio. Fatal al construir el
/// grafo, antes de cualquier ejecución.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterError {
    #[error("unknown parameter `{name}`")]
    Unknown { name: String },
    #[error("missing parameter `{name}`")]
    Missing { name: String },
    #[error("parameter `{name}` expects {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },
    #[error("parameter `{name}` violates constraint `{constraint}` (got {value})")]
    ConstraintViolated {
        name: String,
        constraint: String,
        value: String,
    },
}

impl ParameterError {
    /// Nombre del parámetro causante.
    pub fn name(&self) -> &str {
        match self {
            ParameterError::Unknown { name }
            | ParameterError::Missing { name }
            | ParameterError::TypeMismatch { name, .. }
            | ParameterError::ConstraintViolated { name, .. } => name,
        }
    }
}

/// Dependencias cíclicas o no satisfechas en el cableado de stages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("pipeline has no stages")]
    Empty,
    #[error("duplicate stage id `{0}`")]
    DuplicateStage(String),
    #[error("input `{input}` of stage `{stage}` has no upstream producer")]
    UnsatisfiedInput { stage: String, input: String },
    #[error("input `{input}` of stage `{stage}` has more than one upstream producer: {producers:?}")]
    AmbiguousInput {
        stage: String,
        input: String,
        producers: Vec<String>,
    },
    #[error("input `{input}` of stage `{stage}` expects {expected} but `{producer}` produces {found}")]
    KindMismatch {
        stage: String,
        input: String,
        producer: String,
        expected: ArtifactKind,
        found: ArtifactKind,
    },
    #[error("cycle detected among stages {0:?}")]
    Cycle(Vec<String>),
    #[error("parameter `{name}` is declared with different contracts by stages {stages:?}")]
    ConflictingParameter { name: String, stages: Vec<String> },
}

/// Fallo al construir un `PipelineGraph`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Condición fatal señalada por un stage durante una ejecución.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("remote fetch failed ({remote}) and the fallback dataset is unavailable ({fallback})")]
    FallbackUnavailable { remote: String, fallback: String },
    #[error("degenerate data: test partition has {distinct_classes} distinct class(es), at least 2 are required")]
    DegenerateData { distinct_classes: usize },
    #[error("missing input artifact `{0}`")]
    MissingInput(String),
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error("artifact decode failed: {0}")]
    Decode(#[from] ArtifactDecodeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl StageError {
    /// Etiqueta estable del tipo de error, registrada en los eventos de run.
    pub fn code(&self) -> &'static str {
        match self {
            StageError::FallbackUnavailable { .. } => "ExtractionError",
            StageError::DegenerateData { .. } => "DegenerateDataError",
            StageError::MissingInput(_) => "MissingInput",
            StageError::Parameter(_) => "ParameterError",
            StageError::Decode(_) => "ArtifactDecodeError",
            StageError::Store(_) => "StoreError",
            StageError::InvalidData(_) => "InvalidData",
        }
    }
}
