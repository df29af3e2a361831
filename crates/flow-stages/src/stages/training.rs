//! ModelTraining (Transform): ajusta el random forest sobre `train_data` y
//! empaqueta el modelo con su esquema de features, codificación de
//! etiquetas y estandarización.

use flow_core::{ArtifactKind, ArtifactSlot, ParamSpec, Provenance, StageContext, StageDefinition, StageError,
                StageKind, StageRun};
use log::info;

use super::{params, slots, TRAINING_ID};
use crate::artifacts::{DatasetTable, ModelBundle};
use crate::numeric::forest::{ForestParams, RandomForest};

#[derive(Debug, Clone, Copy, Default)]
pub struct ModelTraining;

impl ModelTraining {
    pub fn train(&self,
                 train: &DatasetTable,
                 tree_count: usize,
                 max_depth: Option<usize>,
                 seed: i64)
                 -> Result<ModelBundle, StageError> {
        let (x, y) = train.dense().map_err(StageError::InvalidData)?;
        let params = ForestParams { tree_count,
                                    max_depth,
                                    seed: seed as u64 };
        let forest = RandomForest::fit(&x, &y, train.class_names.len(), &params).map_err(|e| StageError::InvalidData(e.to_string()))?;
        let correct = x.iter().zip(&y).filter(|(row, label)| forest.predict(row) == **label).count();
        let train_accuracy = correct as f64 / x.len() as f64;
        info!("trained {tree_count} trees on {} rows ({} classes), training accuracy {train_accuracy:.4}",
              x.len(),
              train.distinct_labels());
        Ok(ModelBundle { feature_names: train.feature_names.clone(),
                         label_name: train.label_name.clone(),
                         class_names: train.class_names.clone(),
                         scaler: train.scaler.clone(),
                         forest,
                         tree_count,
                         max_depth,
                         seed,
                         train_rows: x.len(),
                         train_accuracy,
                         schema_version: 1 })
    }
}

impl StageDefinition for ModelTraining {
    fn id(&self) -> &'static str {
        TRAINING_ID
    }

    fn display_name(&self) -> &str {
        "Train Classifier"
    }

    fn kind(&self) -> StageKind {
        StageKind::Transform
    }

    fn inputs(&self) -> Vec<ArtifactSlot> {
        vec![ArtifactSlot::new(slots::TRAIN_DATA, ArtifactKind::Dataset)]
    }

    fn outputs(&self) -> Vec<ArtifactSlot> {
        vec![ArtifactSlot::new(slots::MODEL, ArtifactKind::Model)]
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![params::tree_count(), params::max_depth(), params::seed()]
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<StageRun, StageError> {
        let train: DatasetTable = ctx.load(slots::TRAIN_DATA)?;
        let tree_count = ctx.params().int(params::TREE_COUNT)?;
        let tree_count = usize::try_from(tree_count).map_err(|_| StageError::InvalidData(format!("treeCount {tree_count}")))?;
        let max_depth = ctx.params().limit(params::MAX_DEPTH)?;
        let seed = ctx.params().int(params::SEED)?;
        let model = self.train(&train, tree_count, max_depth, seed)?;
        StageRun::new().output(slots::MODEL, &model, Provenance::Derived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::EMBEDDED_DATASET;
    use crate::stages::{DataPreprocessing, MissingPolicy};
    use crate::table::parse_csv;

    fn train_split() -> DatasetTable {
        let input = parse_csv(EMBEDDED_DATASET).unwrap();
        DataPreprocessing.preprocess(&input, 0.2, 42, MissingPolicy::Drop).unwrap().0
    }

    #[test]
    fn bundle_is_self_describing() {
        let train = train_split();
        let model = ModelTraining.train(&train, 10, Some(5), 42).unwrap();
        assert_eq!(model.feature_names, train.feature_names);
        assert_eq!(model.class_names, vec!["0", "1", "2"]);
        assert_eq!(model.scaler, train.scaler);
        assert_eq!(model.train_rows, 120);
        assert!(model.train_accuracy > 0.9);
        // con el scaler del bundle se pueden puntuar features crudas
        assert_eq!(model.predict_raw(&[5.1, 3.5, 1.4, 0.2]), 0);
        assert_eq!(model.predict_raw(&[6.3, 3.3, 6.0, 2.5]), 2);
    }

    #[test]
    fn incomplete_rows_are_rejected() {
        let mut train = train_split();
        train.features[0][0] = None;
        assert!(matches!(ModelTraining.train(&train, 3, None, 1), Err(StageError::InvalidData(_))));
    }
}
