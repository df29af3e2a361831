//! flow-compiler: serializa un `PipelineGraph` validado a un
//! `CompiledDocument` determinista.
//!
//! - Mismo grafo => mismos bytes (mapas ordenados, JSON con sangría fija).
//! - Compilar no tiene efectos; escribir el documento es una operación
//!   aparte (`Compiler::write`).
//! - Un grafo sin validar se rechaza con `CompilationError`.
mod compiler;
pub mod document;
mod error;

pub use compiler::{artifact_binding, component_name, digest, executor_name, param_binding, Compiler, CompilerOptions,
                   BINDING_MARKER, DEFAULT_OUTPUT};
pub use document::CompiledDocument;
pub use error::CompilationError;
