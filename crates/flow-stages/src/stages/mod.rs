//! Stages del pipeline Iris.
//!
//! | id | inputs | outputs |
//! |---|---|---|
//! | `data-extraction` | - | `dataset` |
//! | `data-preprocessing` | `dataset` | `train_data`, `test_data` |
//! | `model-training` | `train_data` | `model` |
//! | `model-evaluation` | `model`, `test_data` | `metrics` |
mod evaluation;
mod extraction;
pub mod params;
mod preprocessing;
mod training;

pub use evaluation::ModelEvaluation;
pub use extraction::DataExtraction;
pub use preprocessing::{DataPreprocessing, MissingPolicy};
pub use training::ModelTraining;

pub const EXTRACTION_ID: &str = "data-extraction";
pub const PREPROCESSING_ID: &str = "data-preprocessing";
pub const TRAINING_ID: &str = "model-training";
pub const EVALUATION_ID: &str = "model-evaluation";

/// Nombres de canal de los artifacts.
pub mod slots {
    pub const DATASET: &str = "dataset";
    pub const TRAIN_DATA: &str = "train_data";
    pub const TEST_DATA: &str = "test_data";
    pub const MODEL: &str = "model";
    pub const METRICS: &str = "metrics";
}
