//! flow-core: modelo de artifacts, parámetros, contratos de stage y builder
//! del grafo de pipeline.
//!
//! El core no conoce la semántica de los datos (datasets, modelos, métricas):
//! sólo tipa los artifacts por `ArtifactKind` y verifica que el grafo sea
//! acíclico, que cada input tenga un único productor y que cada parámetro
//! cumpla su restricción declarada.
pub mod constants;
pub mod errors;
pub mod graph;
pub mod hashing;
#[macro_use]
pub mod model;
pub mod param;
pub mod stage;

pub use errors::{BuildError, GraphError, ParameterError, StageError};
pub use graph::{Edge, GraphBuilder, GraphState, PipelineGraph, PipelineParameter};
pub use model::{ArtifactDecodeError, ArtifactKind, ArtifactRef, ArtifactSpec, ArtifactStore, FsArtifactStore,
                InMemoryArtifactStore, Provenance, StoreError};
pub use param::{Constraint, ParamOverrides, ParamSpec, ParamType, ParamValue, ResolvedParams};
pub use stage::{ArtifactSlot, StageContext, StageDefinition, StageKind, StageOutput, StageRun, StageSignal};
