//! Contratos de stage.
//!
//! Un stage es una transformación pura de sus inputs declarados y sus
//! parámetros. Este módulo define:
//! - `StageDefinition`: contrato usado por el builder, el compilador y el
//!   runtime.
//! - `StageContext`: vista de sólo lectura de inputs y parámetros.
//! - `StageRun`: outputs y señales producidas por una ejecución.

mod context;
mod definition;
mod run;

pub use context::StageContext;
pub use definition::{ArtifactSlot, StageDefinition, StageKind};
pub use run::{StageOutput, StageRun, StageSignal};
