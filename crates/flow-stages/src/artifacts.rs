//! Payloads tipados de los artifacts del pipeline Iris.
//!
//! Cada payload declara su `ArtifactKind` vía `typed_artifact!` y valida
//! su forma al codificar y decodificar.

use std::fmt::Write as _;

use flow_core::typed_artifact;
use flow_core::ArtifactKind;

use crate::numeric::forest::RandomForest;
use crate::numeric::scaler::ScalerStats;

typed_artifact!(
    /// Tabla de features numéricas con etiqueta codificada.
    ///
    /// `labels[i]` indexa `class_names`. Celdas ausentes son `None`; sólo el
    /// dataset de extracción puede contenerlas.
    DatasetTable {
        feature_names: Vec<String>,
        label_name: String,
        class_names: Vec<String>,
        features: Vec<Vec<Option<f64>>>,
        labels: Vec<Option<usize>>,
        /// Estadísticas de estandarización aplicadas (ajustadas sobre train).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scaler: Option<ScalerStats>,
        #[serde(default)]
        rows_dropped: usize,
        #[serde(default)]
        cells_imputed: usize
    } kind: ArtifactKind::Dataset,
    validate(me) {
        if me.features.len() != me.labels.len() {
            return Err(format!("{} feature rows but {} labels", me.features.len(), me.labels.len()));
        }
        let width = me.feature_names.len();
        if let Some(i) = me.features.iter().position(|r| r.len() != width) {
            return Err(format!("row {i} has {} cells, expected {width}", me.features[i].len()));
        }
        if me.labels.iter().flatten().any(|&l| l >= me.class_names.len()) {
            return Err("label outside the class encoding".to_string());
        }
        match &me.scaler {
            Some(s) if s.len() != width => Err(format!("scaler has {} columns, expected {width}", s.len())),
            _ => Ok(()),
        }
    }
);

impl DatasetTable {
    pub fn new(feature_names: Vec<String>,
               label_name: String,
               class_names: Vec<String>,
               features: Vec<Vec<Option<f64>>>,
               labels: Vec<Option<usize>>)
               -> Self {
        Self { feature_names,
               label_name,
               class_names,
               features,
               labels,
               scaler: None,
               rows_dropped: 0,
               cells_imputed: 0,
               schema_version: 1 }
    }

    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Número de clases distintas presentes.
    pub fn distinct_labels(&self) -> usize {
        let mut seen = vec![false; self.class_names.len()];
        for &l in self.labels.iter().flatten() {
            if let Some(s) = seen.get_mut(l) {
                *s = true;
            }
        }
        seen.into_iter().filter(|s| *s).count()
    }

    /// Matriz densa y etiquetas; falla si queda alguna celda ausente.
    pub fn dense(&self) -> Result<(Vec<Vec<f64>>, Vec<usize>), String> {
        let mut x = Vec::with_capacity(self.n_rows());
        let mut y = Vec::with_capacity(self.n_rows());
        for (i, (row, label)) in self.features.iter().zip(&self.labels).enumerate() {
            let dense: Option<Vec<f64>> = row.iter().copied().collect();
            match (dense, label) {
                (Some(r), Some(l)) => {
                    x.push(r);
                    y.push(*l);
                }
                _ => return Err(format!("row {i} has missing values")),
            }
        }
        Ok((x, y))
    }
}

typed_artifact!(
    /// Clasificador entrenado, autodescriptivo: lleva el esquema de features,
    /// la codificación de etiquetas y la estandarización esperada.
    ModelBundle {
        feature_names: Vec<String>,
        label_name: String,
        class_names: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scaler: Option<ScalerStats>,
        forest: RandomForest,
        tree_count: usize,
        /// `None` = sin límite.
        max_depth: Option<usize>,
        seed: i64,
        train_rows: usize,
        train_accuracy: f64
    } kind: ArtifactKind::Model,
    validate(me) {
        if me.forest.n_classes() != me.class_names.len() {
            return Err(format!("forest predicts {} classes, encoding has {}", me.forest.n_classes(), me.class_names.len()));
        }
        if me.forest.n_features() != me.feature_names.len() {
            return Err(format!("forest expects {} features, schema has {}", me.forest.n_features(), me.feature_names.len()));
        }
        Ok(())
    }
);

impl ModelBundle {
    /// Predice sobre filas ya estandarizadas.
    pub fn predict(&self, rows: &[Vec<f64>]) -> Vec<usize> {
        rows.iter().map(|r| self.forest.predict(r)).collect()
    }

    /// Predice sobre features crudas aplicando la estandarización del modelo.
    pub fn predict_raw(&self, row: &[f64]) -> usize {
        match &self.scaler {
            Some(s) => self.forest.predict(&s.transform(row)),
            None => self.forest.predict(row),
        }
    }
}

/// Métricas de una clase.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClassMetrics {
    pub class_name: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: u32,
}

fn unit(name: &str, v: f64) -> Result<(), String> {
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(format!("{name} = {v} outside [0, 1]"))
    }
}

typed_artifact!(
    /// Métricas de evaluación sobre la partición de test. `precision`,
    /// `recall` y `f1` son promedios macro; los `weighted_*` se ponderan por
    /// soporte.
    MetricsReport {
        accuracy: f64,
        precision: f64,
        recall: f64,
        f1: f64,
        weighted_precision: f64,
        weighted_recall: f64,
        weighted_f1: f64,
        per_class: Vec<ClassMetrics>,
        /// `confusion[truth][predicted]`
        confusion: Vec<Vec<u32>>,
        test_rows: usize
    } kind: ArtifactKind::Metrics,
    validate(me) {
        unit("accuracy", me.accuracy)?;
        unit("precision", me.precision)?;
        unit("recall", me.recall)?;
        unit("f1", me.f1)?;
        unit("weighted_precision", me.weighted_precision)?;
        unit("weighted_recall", me.weighted_recall)?;
        unit("weighted_f1", me.weighted_f1)?;
        for c in &me.per_class {
            unit(&format!("{}.precision", c.class_name), c.precision)?;
            unit(&format!("{}.recall", c.class_name), c.recall)?;
            unit(&format!("{}.f1", c.class_name), c.f1)?;
        }
        Ok(())
    }
);

impl MetricsReport {
    /// Reporte de clasificación en texto, una fila por clase más accuracy y
    /// promedios.
    pub fn classification_report(&self) -> String {
        const AVG: &str = "weighted avg";
        let width = self.per_class
                        .iter()
                        .map(|c| c.class_name.len())
                        .max()
                        .unwrap_or(0)
                        .max(AVG.len());
        let support: u32 = self.per_class.iter().map(|c| c.support).sum();
        let mut out = String::new();
        let _ = writeln!(out, "{:>width$}  {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support");
        let _ = writeln!(out);
        for c in &self.per_class {
            let _ = writeln!(out,
                             "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                             c.class_name, c.precision, c.recall, c.f1, c.support);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{:>width$}  {:>9} {:>9} {:>9.2} {:>9}", "accuracy", "", "", self.accuracy, support);
        let _ = writeln!(out,
                         "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                         "macro avg", self.precision, self.recall, self.f1, support);
        let _ = writeln!(out,
                         "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                         AVG, self.weighted_precision, self.weighted_recall, self.weighted_f1, support);
        out
    }
}
