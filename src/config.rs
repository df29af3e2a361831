//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y expone una estructura inmutable
//! (`CONFIG`). Todas las variables tienen default, así que compilar no
//! requiere argumentos.
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use flow_compiler::{CompilerOptions, DEFAULT_OUTPUT};
use flow_stages::{DataExtraction, DataRemote, FallbackDataset, MirrorRemote, UnreachableRemote};
use once_cell::sync::Lazy;

use crate::AppError;

pub const OUTPUT_VAR: &str = "IRISFLOW_OUTPUT";
pub const ARTIFACT_ROOT_VAR: &str = "IRISFLOW_ARTIFACT_ROOT";
pub const REMOTE_ROOT_VAR: &str = "IRISFLOW_REMOTE_ROOT";
pub const FALLBACK_DATASET_VAR: &str = "IRISFLOW_FALLBACK_DATASET";
pub const STAGE_IMAGE_VAR: &str = "IRISFLOW_STAGE_IMAGE";

pub const DEFAULT_ARTIFACT_ROOT: &str = ".irisflow/artifacts";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Ubicación del documento compilado.
    pub output: PathBuf,
    /// Raíz del store de artifacts en disco (`run`, `stage`).
    pub artifact_root: PathBuf,
    /// Espejo local del store versionado; `None` = inalcanzable.
    pub remote_root: Option<PathBuf>,
    /// Copia de respaldo; `None` = la copia embebida en el binario.
    pub fallback_dataset: Option<PathBuf>,
    pub stage_image: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { output: PathBuf::from(DEFAULT_OUTPUT),
               artifact_root: PathBuf::from(DEFAULT_ARTIFACT_ROOT),
               remote_root: None,
               fallback_dataset: None,
               stage_image: CompilerOptions::default().image }
    }
}

impl AppConfig {
    /// Lee la configuración del entorno del proceso.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente arbitraria. Valores vacíos
    /// cuentan como ausentes.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self { output: get(OUTPUT_VAR).map(PathBuf::from).unwrap_or(defaults.output),
               artifact_root: get(ARTIFACT_ROOT_VAR).map(PathBuf::from)
                                                    .unwrap_or(defaults.artifact_root),
               remote_root: get(REMOTE_ROOT_VAR).map(PathBuf::from),
               fallback_dataset: get(FALLBACK_DATASET_VAR).map(PathBuf::from),
               stage_image: get(STAGE_IMAGE_VAR).unwrap_or(defaults.stage_image) }
    }

    pub fn compiler_options(&self) -> CompilerOptions {
        CompilerOptions { image: self.stage_image.clone() }
    }

    /// Stage de extracción con el remoto y el respaldo configurados.
    pub fn extraction(&self) -> Result<DataExtraction, AppError> {
        let remote: Arc<dyn DataRemote> = match &self.remote_root {
            Some(root) if !root.is_dir() => {
                return Err(AppError::Config(format!("{REMOTE_ROOT_VAR}={} is not a directory", root.display())))
            }
            Some(root) => Arc::new(MirrorRemote::new(root)),
            None => Arc::new(UnreachableRemote),
        };
        let fallback = match &self.fallback_dataset {
            Some(path) => FallbackDataset::File(path.clone()),
            None => FallbackDataset::Embedded,
        };
        Ok(DataExtraction::new(remote, fallback))
    }
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    let _ = dotenvy::dotenv();
    AppConfig::from_env()
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn every_variable_has_a_default() {
        let cfg = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.output, PathBuf::from("components/pipeline.json"));
        assert!(cfg.stage_image.starts_with("irisflow/stages:"));
    }

    #[test]
    fn environment_overrides_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[(OUTPUT_VAR, "out/p.json"),
                                                  (REMOTE_ROOT_VAR, "/srv/mirror"),
                                                  (STAGE_IMAGE_VAR, "registry/iris:1"),
                                                  (FALLBACK_DATASET_VAR, "  ")]));
        assert_eq!(cfg.output, PathBuf::from("out/p.json"));
        assert_eq!(cfg.remote_root, Some(PathBuf::from("/srv/mirror")));
        assert_eq!(cfg.compiler_options().image, "registry/iris:1");
        assert_eq!(cfg.fallback_dataset, None);
    }

    #[test]
    fn missing_mirror_directory_is_a_config_error() {
        let cfg = AppConfig::from_lookup(lookup(&[(REMOTE_ROOT_VAR, "/definitely/not/here")]));
        assert!(matches!(cfg.extraction(), Err(AppError::Config(_))));
    }
}
