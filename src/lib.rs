//! irisflow: configuración, arranque de logging y punto de entrada de
//! compilación con parámetros por defecto.
//!
//! La lógica de dominio vive en los crates del workspace; este crate sólo
//! los conecta con el entorno (`CONFIG`) para los binarios.

pub mod config;
pub mod error;
pub mod logging;

use std::path::PathBuf;

use flow_compiler::{CompiledDocument, Compiler};
use flow_core::ParamOverrides;
use flow_runtime::StageRegistry;
use flow_stages::{iris_builder, iris_stages};

pub use config::{AppConfig, CONFIG};
pub use error::AppError;

/// Grafo Iris con `overrides`, compilado con las opciones de `config`.
pub fn compile_pipeline(config: &AppConfig, overrides: &ParamOverrides) -> Result<CompiledDocument, AppError> {
    let graph = iris_builder(config.extraction()?).params(overrides).build()?;
    Ok(Compiler::new(config.compiler_options()).compile(&graph)?)
}

/// Compila con los defaults y escribe en la ubicación fija. Devuelve la ruta
/// y el digest del documento.
pub fn compile_default(config: &AppConfig) -> Result<(PathBuf, String), AppError> {
    let doc = compile_pipeline(config, &ParamOverrides::new())?;
    let digest = Compiler::new(config.compiler_options()).write(&doc, &config.output)?;
    Ok((config.output.clone(), digest))
}

/// Stages ejecutables, con la extracción configurada según `config`.
pub fn stage_registry(config: &AppConfig) -> Result<StageRegistry, AppError> {
    Ok(StageRegistry::with_stages(iris_stages(config.extraction()?)))
}
