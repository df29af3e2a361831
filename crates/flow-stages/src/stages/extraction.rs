//! DataExtraction (Source)
//!
//! - Intenta obtener `(repoLocator, dataPath)` del store remoto.
//! - Ante cualquier fallo usa la copia de respaldo y emite la señal
//!   `fallback` con la causa.
//! - Sólo falla si la copia de respaldo tampoco está disponible.

use std::sync::Arc;

use flow_core::{ArtifactKind, ArtifactSlot, ParamSpec, Provenance, StageContext, StageDefinition, StageError,
                StageKind, StageRun};
use log::{info, warn};
use serde_json::json;

use super::{params, slots, EXTRACTION_ID};
use crate::artifacts::DatasetTable;
use crate::remote::{DataRemote, FallbackDataset, UnreachableRemote};
use crate::table::parse_csv;

#[derive(Debug, Clone)]
pub struct DataExtraction {
    remote: Arc<dyn DataRemote>,
    fallback: FallbackDataset,
}

impl Default for DataExtraction {
    fn default() -> Self {
        Self::new(Arc::new(UnreachableRemote), FallbackDataset::Embedded)
    }
}

impl DataExtraction {
    pub fn new(remote: Arc<dyn DataRemote>, fallback: FallbackDataset) -> Self {
        Self { remote, fallback }
    }

    /// Dataset y su procedencia. Pública para poder usarse fuera de un run.
    pub fn extract(&self, repo_locator: &str, data_path: &str) -> Result<(DatasetTable, Provenance, Option<String>), StageError> {
        let remote = self.remote
                         .fetch(repo_locator, data_path)
                         .and_then(|text| parse_csv(&text));
        match remote {
            Ok(table) => Ok((table, Provenance::Remote, None)),
            Err(cause) => {
                warn!("remote fetch of {data_path} from {repo_locator} failed ({cause}); using {}",
                      self.fallback.describe());
                let table = self.fallback
                                .load()
                                .and_then(|text| parse_csv(&text))
                                .map_err(|fb| StageError::FallbackUnavailable { remote: cause.to_string(),
                                                                                fallback: fb.to_string() })?;
                Ok((table, Provenance::Fallback, Some(cause.to_string())))
            }
        }
    }
}

impl StageDefinition for DataExtraction {
    fn id(&self) -> &'static str {
        EXTRACTION_ID
    }

    fn display_name(&self) -> &str {
        "Extract Data"
    }

    fn kind(&self) -> StageKind {
        StageKind::Source
    }

    fn inputs(&self) -> Vec<ArtifactSlot> {
        Vec::new()
    }

    fn outputs(&self) -> Vec<ArtifactSlot> {
        vec![ArtifactSlot::new(slots::DATASET, ArtifactKind::Dataset)]
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![params::repo_locator(), params::data_path()]
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<StageRun, StageError> {
        let repo = ctx.params().text(params::REPO_LOCATOR)?;
        let path = ctx.params().text(params::DATA_PATH)?;
        let (table, provenance, cause) = self.extract(repo, path)?;
        info!("extracted {} rows x {} features ({provenance})",
              table.n_rows(),
              table.n_features());
        let mut run = StageRun::new().output(slots::DATASET, &table, provenance)?;
        if let Some(cause) = cause {
            run = run.signal("fallback",
                             json!({ "reason": cause, "source": self.fallback.describe(), "rows": table.n_rows() }));
        }
        Ok(run)
    }
}
