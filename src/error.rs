use flow_compiler::CompilationError;
use flow_core::BuildError;
use flow_runtime::RuntimeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Uso incorrecto: {0}")]
    Usage(String),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Compilation(#[from] CompilationError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_variant_format() {
        let err = AppError::Config("IRISFLOW_STAGE_IMAGE vacío".into());
        assert_eq!(err.to_string(), "Error de configuración: IRISFLOW_STAGE_IMAGE vacío");
    }

    #[test]
    fn usage_variant_format() {
        let err = AppError::Usage("--param seed sin resolver".into());
        assert_eq!(err.to_string(), "Uso incorrecto: --param seed sin resolver");
    }
}
