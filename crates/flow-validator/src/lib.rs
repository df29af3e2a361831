//! flow-validator: verificación estructural de un documento de pipeline
//! compilado, independiente del compilador.
//!
//! Comprueba:
//! - las secciones `pipelineInfo`, `components` y `deploymentSpec`;
//! - que `components` no esté vacío;
//! - que ningún nombre de componente ni valor de parámetro sea un
//!   placeholder (`PLACEHOLDER`, `TODO`, `{{ .. }}`, `YOUR_USERNAME`, ...).
//!
//! Devuelve un `ValidationReport` con veredicto, resumen y advertencias.
mod placeholder;
mod report;
mod rules;

pub use placeholder::{is_placeholder, PLACEHOLDER_MARKERS, PLACEHOLDER_TOKENS};
pub use report::{Summary, ValidationReport};
pub use rules::{validate_path, validate_str, validate_value, REQUIRED_SECTIONS};

use thiserror::Error;

/// Documento compilado estructuralmente inválido.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructuralValidationError {
    #[error("cannot read {path}: {reason}")]
    Unreadable { path: String, reason: String },
    #[error("invalid document structure: {0}")]
    InvalidStructure(String),
    #[error("missing required field `{0}`")]
    MissingField(String),
    #[error("`components` is empty")]
    EmptyComponents,
    #[error("placeholder `{token}` found at {location}")]
    Placeholder { token: String, location: String },
}
