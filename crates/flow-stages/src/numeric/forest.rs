//! Random forest de árboles CART (Gini) con bagging.
//!
//! Cada árbol se ajusta sobre una muestra bootstrap y evalúa
//! `ceil(sqrt(d))` features candidatas por nodo. Los árboles se ajustan en
//! paralelo con rayon; cada uno usa su propio RNG derivado de
//! `(seed, índice)`, así el bosque no depende del orden de los hilos.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ForestError {
    #[error("training set is empty")]
    Empty,
    #[error("tree count must be at least 1")]
    NoTrees,
    #[error("max depth must be at least 1")]
    ZeroDepth,
    #[error("{rows} rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },
    #[error("row {0} has a different width")]
    Ragged(usize),
    #[error("label {label} outside 0..{n_classes}")]
    Label { label: usize, n_classes: usize },
}

/// Hiperparámetros del bosque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub tree_count: usize,
    /// `None` = árboles sin límite de profundidad.
    pub max_depth: Option<usize>,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Leaf { proba: Vec<f64> },
    Split { feature: usize, threshold: f64, left: usize, right: usize },
}

/// Árbol plano: el nodo 0 es la raíz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    pub fn predict_proba(&self, row: &[f64]) -> &[f64] {
        let mut i = 0;
        loop {
            match self.nodes.get(i) {
                Some(Node::Leaf { proba }) => return proba,
                Some(Node::Split { feature,
                                   threshold,
                                   left,
                                   right, }) => {
                    let v = row.get(*feature).copied().unwrap_or(f64::NAN);
                    i = if v <= *threshold { *left } else { *right };
                }
                None => return &[],
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], i: usize) -> usize {
            match nodes.get(i) {
                Some(Node::Split { left, right, .. }) => 1 + walk(nodes, *left).max(walk(nodes, *right)),
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_classes: usize,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Ajusta el bosque sobre `x` (filas) e `y` (clase por fila).
    pub fn fit(x: &[Vec<f64>], y: &[usize], n_classes: usize, params: &ForestParams) -> Result<Self, ForestError> {
        if x.is_empty() {
            return Err(ForestError::Empty);
        }
        if x.len() != y.len() {
            return Err(ForestError::LengthMismatch { rows: x.len(),
                                                     labels: y.len() });
        }
        if params.tree_count == 0 {
            return Err(ForestError::NoTrees);
        }
        if params.max_depth == Some(0) {
            return Err(ForestError::ZeroDepth);
        }
        let n_features = x[0].len();
        if let Some(i) = x.iter().position(|r| r.len() != n_features) {
            return Err(ForestError::Ragged(i));
        }
        if let Some(&label) = y.iter().find(|&&l| l >= n_classes) {
            return Err(ForestError::Label { label, n_classes });
        }

        let max_features = ((n_features as f64).sqrt().ceil() as usize).clamp(1, n_features.max(1));
        let trees = (0..params.tree_count).into_par_iter()
                                          .map(|t| {
                                              let mut rng = StdRng::seed_from_u64(tree_seed(params.seed, t));
                                              let mut sample: Vec<usize> =
                                                  (0..x.len()).map(|_| rng.random_range(0..x.len())).collect();
                                              let mut grower = TreeGrower { x,
                                                                            y,
                                                                            n_classes,
                                                                            n_features,
                                                                            max_features,
                                                                            max_depth: params.max_depth,
                                                                            rng,
                                                                            nodes: Vec::new() };
                                              grower.grow(&mut sample, 0);
                                              DecisionTree { nodes: grower.nodes }
                                          })
                                          .collect();
        Ok(Self { n_classes,
                  n_features,
                  trees })
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Promedio de las probabilidades de hoja de todos los árboles.
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut acc = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (a, p) in acc.iter_mut().zip(tree.predict_proba(row)) {
                *a += p;
            }
        }
        let n = self.trees.len().max(1) as f64;
        acc.iter_mut().for_each(|a| *a /= n);
        acc
    }

    /// Clase más probable; en empate gana el menor índice.
    pub fn predict(&self, row: &[f64]) -> usize {
        let proba = self.predict_proba(row);
        let mut best = 0;
        for (k, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = k;
            }
        }
        best
    }
}

/// Semilla del árbol `index` (mezcla splitmix64).
fn tree_seed(seed: u64, index: usize) -> u64 {
    let mut z = seed.wrapping_add((index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

struct TreeGrower<'a> {
    x: &'a [Vec<f64>],
    y: &'a [usize],
    n_classes: usize,
    n_features: usize,
    max_features: usize,
    max_depth: Option<usize>,
    rng: StdRng,
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl TreeGrower<'_> {
    fn counts(&self, rows: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in rows {
            counts[self.y[i]] += 1;
        }
        counts
    }

    fn leaf(&mut self, counts: &[usize]) -> usize {
        let total = counts.iter().sum::<usize>().max(1) as f64;
        self.nodes.push(Node::Leaf { proba: counts.iter().map(|&c| c as f64 / total).collect() });
        self.nodes.len() - 1
    }

    /// Crece el subárbol de `rows` y devuelve el índice de su raíz.
    fn grow(&mut self, rows: &mut [usize], depth: usize) -> usize {
        let counts = self.counts(rows);
        let parent = gini(&counts, rows.len());
        let depth_reached = self.max_depth.is_some_and(|d| depth >= d);
        if rows.len() < 2 || parent == 0.0 || depth_reached {
            return self.leaf(&counts);
        }
        let Some(best) = self.best_split(rows) else {
            return self.leaf(&counts);
        };
        if best.impurity >= parent - 1e-12 {
            return self.leaf(&counts);
        }

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { proba: Vec::new() });
        let x = self.x;
        rows.sort_by(|&a, &b| {
                (x[a][best.feature] > best.threshold).cmp(&(x[b][best.feature] > best.threshold))
                                                     .then(a.cmp(&b))
            });
        let cut = rows.partition_point(|&i| x[i][best.feature] <= best.threshold);
        let (left_rows, right_rows) = rows.split_at_mut(cut);
        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[id] = Node::Split { feature: best.feature,
                                       threshold: best.threshold,
                                       left,
                                       right };
        id
    }

    fn best_split(&mut self, rows: &[usize]) -> Option<BestSplit> {
        let mut features: Vec<usize> = (0..self.n_features).collect();
        features.shuffle(&mut self.rng);
        features.truncate(self.max_features);

        let n = rows.len();
        let mut best: Option<BestSplit> = None;
        let mut sorted = rows.to_vec();
        for &f in &features {
            let x = self.x;
            sorted.sort_by(|&a, &b| x[a][f].total_cmp(&x[b][f]).then(a.cmp(&b)));
            let mut left = vec![0usize; self.n_classes];
            let mut right = self.counts(&sorted);
            for pos in 1..n {
                let moved = sorted[pos - 1];
                left[self.y[moved]] += 1;
                right[self.y[moved]] -= 1;
                let lo = x[moved][f];
                let hi = x[sorted[pos]][f];
                if hi <= lo {
                    continue;
                }
                let impurity = (pos as f64 * gini(&left, pos) + (n - pos) as f64 * gini(&right, n - pos)) / n as f64;
                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    best = Some(BestSplit { feature: f,
                                            threshold: lo + (hi - lo) / 2.0,
                                            impurity });
                }
            }
        }
        best
    }
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let t = total as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / t).powi(2)).sum::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..30 {
            let jitter = (i % 5) as f64 * 0.1;
            x.push(vec![0.0 + jitter, 1.0 - jitter]);
            y.push(0);
            x.push(vec![5.0 + jitter, 4.0 - jitter]);
            y.push(1);
        }
        (x, y)
    }

    fn params(seed: u64) -> ForestParams {
        ForestParams { tree_count: 15,
                       max_depth: Some(4),
                       seed }
    }

    #[test]
    fn separable_blobs_are_learned() {
        let (x, y) = blobs();
        let forest = RandomForest::fit(&x, &y, 2, &params(1)).unwrap();
        assert_eq!(forest.predict(&[0.2, 0.9]), 0);
        assert_eq!(forest.predict(&[5.1, 3.8]), 1);
        let p = forest.predict_proba(&[0.2, 0.9]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn same_seed_gives_identical_forest() {
        let (x, y) = blobs();
        let a = RandomForest::fit(&x, &y, 2, &params(9)).unwrap();
        let b = RandomForest::fit(&x, &y, 2, &params(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn depth_limit_is_respected() {
        let (x, y) = blobs();
        let p = ForestParams { tree_count: 5,
                               max_depth: Some(1),
                               seed: 3 };
        let forest = RandomForest::fit(&x, &y, 2, &p).unwrap();
        assert!(forest.trees().iter().all(|t| t.depth() <= 1));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let (x, y) = blobs();
        assert_eq!(RandomForest::fit(&[], &[], 2, &params(0)), Err(ForestError::Empty));
        assert_eq!(RandomForest::fit(&x, &y[..3], 2, &params(0)),
                   Err(ForestError::LengthMismatch { rows: 60, labels: 3 }));
        let no_trees = ForestParams { tree_count: 0,
                                      ..params(0) };
        assert_eq!(RandomForest::fit(&x, &y, 2, &no_trees), Err(ForestError::NoTrees));
        assert!(matches!(RandomForest::fit(&x, &y, 1, &params(0)), Err(ForestError::Label { .. })));
    }
}
