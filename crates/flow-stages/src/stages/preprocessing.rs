//! DataPreprocessing (Transform)
//!
//! Orden: filas incompletas (según `missingPolicy`), split estratificado
//! determinista, imputación con medias de train, estandarización ajustada
//! sólo sobre train y aplicada a ambas particiones.

use std::fmt;

use flow_core::{ArtifactKind, ArtifactSlot, ParamSpec, ParameterError, Provenance, StageContext, StageDefinition,
                StageError, StageKind, StageRun};
use log::{debug, info};

use super::{params, slots, PREPROCESSING_ID};
use crate::artifacts::DatasetTable;
use crate::numeric::scaler::ScalerStats;
use crate::numeric::split::stratified_split;

/// Tratamiento de filas con features ausentes. Las filas sin etiqueta se
/// descartan siempre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPolicy {
    #[default]
    Drop,
    /// Rellena con la media de la columna en train.
    ImputeMean,
}

impl MissingPolicy {
    pub fn parse(raw: &str) -> Result<Self, ParameterError> {
        match raw {
            "drop" => Ok(MissingPolicy::Drop),
            "impute-mean" => Ok(MissingPolicy::ImputeMean),
            other => Err(ParameterError::ConstraintViolated { name: params::MISSING_POLICY.to_string(),
                                                              constraint: "one of [drop, impute-mean]".to_string(),
                                                              value: format!("{other:?}") }),
        }
    }
}

impl fmt::Display for MissingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
                        MissingPolicy::Drop => "drop",
                        MissingPolicy::ImputeMean => "impute-mean",
                    })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DataPreprocessing;

impl DataPreprocessing {
    /// Particiones `(train, test)` estandarizadas con estadísticas de train.
    pub fn preprocess(&self,
                      input: &DatasetTable,
                      test_fraction: f64,
                      seed: i64,
                      policy: MissingPolicy)
                      -> Result<(DatasetTable, DatasetTable), StageError> {
        let keep: Vec<usize> = (0..input.n_rows()).filter(|&i| {
                                                      input.labels[i].is_some()
                                                      && (policy == MissingPolicy::ImputeMean
                                                          || input.features[i].iter().all(Option::is_some))
                                                  })
                                                  .collect();
        let dropped = input.n_rows() - keep.len();
        if dropped > 0 {
            info!("dropped {dropped} row(s) with missing values (policy {policy})");
        }
        let labels: Vec<usize> = keep.iter().filter_map(|&i| input.labels[i]).collect();
        let split = stratified_split(&labels, test_fraction, seed as u64).map_err(|e| StageError::InvalidData(e.to_string()))?;

        let take = |idx: &[usize]| -> (Vec<Vec<Option<f64>>>, Vec<usize>) {
            idx.iter()
               .map(|&k| (input.features[keep[k]].clone(), labels[k]))
               .unzip()
        };
        let (mut train_rows, train_labels) = take(&split.train);
        let (mut test_rows, test_labels) = take(&split.test);

        let width = input.n_features();
        let mut imputed = 0;
        if policy == MissingPolicy::ImputeMean {
            let means = train_means(&train_rows, width)?;
            imputed += fill(&mut train_rows, &means);
            imputed += fill(&mut test_rows, &means);
            debug!("imputed {imputed} cell(s) with train means {means:?}");
        }
        let train_x = densify(train_rows)?;
        let test_x = densify(test_rows)?;

        let stats = ScalerStats::fit(&train_x, width);
        let partition = |x: &[Vec<f64>], y: Vec<usize>| {
            let mut table = DatasetTable::new(input.feature_names.clone(),
                                              input.label_name.clone(),
                                              input.class_names.clone(),
                                              stats.transform_all(x)
                                                   .into_iter()
                                                   .map(|r| r.into_iter().map(Some).collect())
                                                   .collect(),
                                              y.into_iter().map(Some).collect());
            table.scaler = Some(stats.clone());
            table.rows_dropped = dropped;
            table.cells_imputed = imputed;
            table
        };
        let train = partition(&train_x, train_labels);
        let test = partition(&test_x, test_labels);
        info!("split {} rows into train={} test={} (testFraction={test_fraction}, seed={seed})",
              keep.len(),
              train.n_rows(),
              test.n_rows());
        Ok((train, test))
    }
}

fn train_means(rows: &[Vec<Option<f64>>], width: usize) -> Result<Vec<f64>, StageError> {
    (0..width).map(|j| {
                  let present: Vec<f64> = rows.iter().filter_map(|r| r[j]).collect();
                  if present.is_empty() {
                      Err(StageError::InvalidData(format!("column {j} has no values in the train partition")))
                  } else {
                      Ok(present.iter().sum::<f64>() / present.len() as f64)
                  }
              })
              .collect()
}

fn fill(rows: &mut [Vec<Option<f64>>], means: &[f64]) -> usize {
    let mut n = 0;
    for row in rows {
        for (cell, m) in row.iter_mut().zip(means) {
            if cell.is_none() {
                *cell = Some(*m);
                n += 1;
            }
        }
    }
    n
}

fn densify(rows: Vec<Vec<Option<f64>>>) -> Result<Vec<Vec<f64>>, StageError> {
    rows.into_iter()
        .map(|r| {
            r.into_iter()
             .collect::<Option<Vec<f64>>>()
             .ok_or_else(|| StageError::InvalidData("missing value after preprocessing".into()))
        })
        .collect()
}

impl StageDefinition for DataPreprocessing {
    fn id(&self) -> &'static str {
        PREPROCESSING_ID
    }

    fn display_name(&self) -> &str {
        "Preprocess Data"
    }

    fn kind(&self) -> StageKind {
        StageKind::Transform
    }

    fn inputs(&self) -> Vec<ArtifactSlot> {
        vec![ArtifactSlot::new(slots::DATASET, ArtifactKind::Dataset)]
    }

    fn outputs(&self) -> Vec<ArtifactSlot> {
        vec![ArtifactSlot::new(slots::TRAIN_DATA, ArtifactKind::Dataset),
             ArtifactSlot::new(slots::TEST_DATA, ArtifactKind::Dataset)]
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![params::test_fraction(), params::seed(), params::missing_policy()]
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<StageRun, StageError> {
        let input: DatasetTable = ctx.load(slots::DATASET)?;
        let fraction = ctx.params().float(params::TEST_FRACTION)?;
        let seed = ctx.params().int(params::SEED)?;
        let policy = MissingPolicy::parse(ctx.params().text(params::MISSING_POLICY)?)?;
        let (train, test) = self.preprocess(&input, fraction, seed, policy)?;
        StageRun::new().output(slots::TRAIN_DATA, &train, Provenance::Derived)?
                       .output(slots::TEST_DATA, &test, Provenance::Derived)
    }
}
