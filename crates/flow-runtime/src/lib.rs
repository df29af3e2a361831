//! flow-runtime: runtime local de referencia para documentos compilados.
//!
//! - `submit` pasa el documento por el validador estructural, resuelve los
//!   parámetros enviados contra las restricciones declaradas y ejecuta las
//!   tareas en el orden del documento.
//! - Cada transición se registra en un `EventStore` append-only; el estado
//!   de un run (`RunStatus`) se deriva por replay de sus eventos.
//! - Los artifacts se pasan por referencia (locator) a través de un
//!   `ArtifactStore`.
mod error;
pub mod event;
pub mod registry;
pub mod replay;
mod runtime;

pub use error::RuntimeError;
pub use event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
pub use registry::StageRegistry;
pub use replay::{replay, RunState, RunStatus, TaskSlot, TaskStatus};
pub use runtime::{LocalRuntime, RunSubmitter};
