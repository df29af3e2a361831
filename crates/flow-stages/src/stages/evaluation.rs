//! ModelEvaluation (Sink): puntúa el modelo sobre `test_data` y produce
//! accuracy, precision/recall/F1 por clase y promedios.

use flow_core::{ArtifactKind, ArtifactSlot, ParamSpec, Provenance, StageContext, StageDefinition, StageError,
                StageKind, StageRun};
use log::info;

use super::{slots, EVALUATION_ID};
use crate::artifacts::{ClassMetrics, DatasetTable, MetricsReport, ModelBundle};
use crate::numeric::metrics::{accuracy, macro_average, precision_recall_by_class, weighted_average, ConfusionMatrix};

#[derive(Debug, Clone, Copy, Default)]
pub struct ModelEvaluation;

impl ModelEvaluation {
    pub fn evaluate(&self, model: &ModelBundle, test: &DatasetTable) -> Result<MetricsReport, StageError> {
        let distinct = test.distinct_labels();
        if distinct < 2 {
            return Err(StageError::DegenerateData { distinct_classes: distinct });
        }
        if model.feature_names != test.feature_names || model.class_names != test.class_names {
            return Err(StageError::InvalidData("test partition schema differs from the model schema".into()));
        }
        if model.scaler != test.scaler {
            return Err(StageError::InvalidData("test partition was standardized with different statistics".into()));
        }
        let (x, y) = test.dense().map_err(StageError::InvalidData)?;
        let predicted = model.predict(&x);

        let cm = ConfusionMatrix::from_predictions(model.class_names.len(), &y, &predicted);
        let stats = precision_recall_by_class(&cm);
        let macro_avg = macro_average(&cm, &stats);
        let weighted = weighted_average(&stats);
        let per_class = model.class_names
                             .iter()
                             .zip(&stats)
                             .map(|(name, s)| ClassMetrics { class_name: name.clone(),
                                                             precision: s.precision,
                                                             recall: s.recall,
                                                             f1: s.f1,
                                                             support: s.support })
                             .collect();
        let report = MetricsReport { accuracy: accuracy(&cm),
                                     precision: macro_avg.precision,
                                     recall: macro_avg.recall,
                                     f1: macro_avg.f1,
                                     weighted_precision: weighted.precision,
                                     weighted_recall: weighted.recall,
                                     weighted_f1: weighted.f1,
                                     per_class,
                                     confusion: cm.rows(),
                                     test_rows: y.len(),
                                     schema_version: 1 };
        info!("accuracy {:.4}, precision {:.4}, recall {:.4}, f1 {:.4} on {} rows",
              report.accuracy,
              report.weighted_precision,
              report.weighted_recall,
              report.weighted_f1,
              report.test_rows);
        Ok(report)
    }
}

impl StageDefinition for ModelEvaluation {
    fn id(&self) -> &'static str {
        EVALUATION_ID
    }

    fn display_name(&self) -> &str {
        "Evaluate Model"
    }

    fn kind(&self) -> StageKind {
        StageKind::Sink
    }

    fn inputs(&self) -> Vec<ArtifactSlot> {
        vec![ArtifactSlot::new(slots::MODEL, ArtifactKind::Model),
             ArtifactSlot::new(slots::TEST_DATA, ArtifactKind::Dataset)]
    }

    fn outputs(&self) -> Vec<ArtifactSlot> {
        vec![ArtifactSlot::new(slots::METRICS, ArtifactKind::Metrics)]
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        Vec::new()
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<StageRun, StageError> {
        let model: ModelBundle = ctx.load(slots::MODEL)?;
        let test: DatasetTable = ctx.load(slots::TEST_DATA)?;
        let report = self.evaluate(&model, &test)?;
        StageRun::new().output(slots::METRICS, &report, Provenance::Derived)
    }
}
