//! Grafo de pipeline: stages como nodos, dependencias por artifact como
//! aristas.
//!
//! Notas de diseño
//! - `GraphBuilder` acumula stages y overrides; `build` valida y devuelve un
//!   `PipelineGraph` en estado `Validated`.
//! - `draft` devuelve el grafo sin validar: el compilador lo rechaza.
//! - Un input se conecta primero por nombre de canal (output homónimo de otro
//!   stage) y, si ningún output se llama igual, por kind. En ambos casos debe
//!   existir exactamente un productor.

mod builder;
mod pipeline;

pub use builder::GraphBuilder;
pub use pipeline::{Edge, GraphState, PipelineGraph, PipelineParameter};
