//! Acceso al store versionado remoto y a la copia de respaldo del dataset.
//!
//! `DataRemote` es la costura con el mecanismo de "pull artifact by
//! locator". `MirrorRemote` resuelve `(repoLocator, dataPath)` contra un
//! directorio espejo `<root>/<repo-slug>/<dataPath>`; `UnreachableRemote`
//! simula un store caído.

use std::fmt::Debug;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::errors::ExtractionError;

/// Copia de referencia empaquetada en el binario.
pub const EMBEDDED_DATASET: &str = include_str!("../data/iris.csv");

pub trait DataRemote: Debug + Send + Sync {
    /// Contenido del dataset `data_path` del repositorio `repo_locator`.
    fn fetch(&self, repo_locator: &str, data_path: &str) -> Result<String, ExtractionError>;
}

/// Store remoto que nunca responde.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnreachableRemote;

impl DataRemote for UnreachableRemote {
    fn fetch(&self, repo_locator: &str, _data_path: &str) -> Result<String, ExtractionError> {
        Err(ExtractionError::Unreachable(format!("no remote configured for {repo_locator}")))
    }
}

/// Espejo local del store remoto.
#[derive(Debug, Clone)]
pub struct MirrorRemote {
    root: PathBuf,
}

impl MirrorRemote {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ruta del dataset dentro del espejo.
    pub fn resolve(&self, repo_locator: &str, data_path: &str) -> Result<PathBuf, ExtractionError> {
        let rel = Path::new(data_path);
        let escapes = rel.components()
                         .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if data_path.trim().is_empty() || escapes {
            return Err(ExtractionError::Unauthorized(data_path.to_string()));
        }
        Ok(self.root.join(repo_slug(repo_locator)).join(rel))
    }
}

impl DataRemote for MirrorRemote {
    fn fetch(&self, repo_locator: &str, data_path: &str) -> Result<String, ExtractionError> {
        if !self.root.is_dir() {
            return Err(ExtractionError::Unreachable(self.root.display().to_string()));
        }
        let path = self.resolve(repo_locator, data_path)?;
        std::fs::read_to_string(&path).map_err(|e| match e.kind() {
                                          ErrorKind::NotFound => ExtractionError::NotFound { repo: repo_locator.to_string(),
                                                                                             path: data_path.to_string() },
                                          ErrorKind::PermissionDenied => {
                                              ExtractionError::Unauthorized(path.display().to_string())
                                          }
                                          _ => ExtractionError::Io { path: path.clone(),
                                                                     source: e },
                                      })
    }
}

/// Nombre del repositorio: último segmento del locator, sin `.git`.
pub fn repo_slug(locator: &str) -> String {
    let trimmed = locator.trim().trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':']).next().unwrap_or(trimmed);
    let slug = last.strip_suffix(".git").unwrap_or(last);
    if slug.is_empty() {
        "repository".to_string()
    } else {
        slug.to_string()
    }
}

/// Copia de respaldo usada cuando el remoto falla.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FallbackDataset {
    #[default]
    Embedded,
    File(PathBuf),
}

impl FallbackDataset {
    pub fn load(&self) -> Result<String, ExtractionError> {
        match self {
            FallbackDataset::Embedded => Ok(EMBEDDED_DATASET.to_string()),
            FallbackDataset::File(path) => std::fs::read_to_string(path).map_err(|e| ExtractionError::Io { path: path.clone(),
                                                                                                           source: e }),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            FallbackDataset::Embedded => "embedded reference copy".to_string(),
            FallbackDataset::File(path) => path.display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_strips_scheme_and_suffix() {
        assert_eq!(repo_slug("https://github.com/acme/mlops-kubeflow-assignment.git"), "mlops-kubeflow-assignment");
        assert_eq!(repo_slug("git@github.com:acme/iris"), "iris");
        assert_eq!(repo_slug("https://example.org/data/"), "data");
    }

    #[test]
    fn mirror_fetch_and_failure_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let repo_dir = dir.path().join("iris-repo").join("data");
        std::fs::create_dir_all(&repo_dir).unwrap();
        std::fs::write(repo_dir.join("iris.csv"), "a,target\n1,0\n").unwrap();

        let remote = MirrorRemote::new(dir.path());
        let text = remote.fetch("https://host/x/iris-repo.git", "data/iris.csv").unwrap();
        assert!(text.starts_with("a,target"));

        assert!(matches!(remote.fetch("https://host/x/iris-repo.git", "data/other.csv"),
                         Err(ExtractionError::NotFound { .. })));
        assert!(matches!(remote.fetch("https://host/x/iris-repo.git", "../secret.csv"),
                         Err(ExtractionError::Unauthorized(_))));
        assert!(matches!(MirrorRemote::new(dir.path().join("gone")).fetch("r", "d.csv"),
                         Err(ExtractionError::Unreachable(_))));
    }

    #[test]
    fn missing_fallback_file_is_an_error() {
        let fb = FallbackDataset::File(PathBuf::from("/definitely/not/here.csv"));
        assert!(fb.load().is_err());
        assert!(FallbackDataset::Embedded.load().unwrap().lines().count() > 150);
    }
}
