//! flow-stages: los cuatro stages del pipeline de clasificación Iris y su
//! cableado.
//!
//! - `stages`: Extraction, Preprocessing, Training, Evaluation.
//! - `artifacts`: payloads tipados (`DatasetTable`, `ModelBundle`,
//!   `MetricsReport`).
//! - `numeric`: split estratificado, estandarización, random forest y
//!   métricas.
//! - `remote`: acceso al store versionado remoto y copia de respaldo.
//! - `pipeline`: grafo Iris con sus parámetros.
pub mod artifacts;
pub mod errors;
pub mod numeric;
pub mod pipeline;
pub mod remote;
pub mod stages;
pub mod table;

pub use artifacts::{ClassMetrics, DatasetTable, MetricsReport, ModelBundle};
pub use errors::ExtractionError;
pub use pipeline::{iris_builder, iris_pipeline, iris_stages, PIPELINE_DESCRIPTION, PIPELINE_NAME};
pub use remote::{DataRemote, FallbackDataset, MirrorRemote, UnreachableRemote};
pub use stages::{DataExtraction, DataPreprocessing, ModelEvaluation, ModelTraining};
