//! Métricas de clasificación a partir de una matriz de confusión.

/// Matriz de confusión `K x K`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub n_classes: usize,
    /// Conteos row-major (`truth * K + predicted`).
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    pub fn new(n_classes: usize) -> Self {
        Self { n_classes,
               counts: vec![0; n_classes * n_classes] }
    }

    pub fn from_predictions(n_classes: usize, truth: &[usize], predicted: &[usize]) -> Self {
        let mut cm = Self::new(n_classes);
        for (&t, &p) in truth.iter().zip(predicted) {
            cm.add(t, p);
        }
        cm
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        let idx = truth * self.n_classes + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }

    pub fn rows(&self) -> Vec<Vec<u32>> {
        self.counts.chunks(self.n_classes.max(1)).map(<[u32]>::to_vec).collect()
    }

    /// Veces que se predijo la clase `k`.
    pub fn predicted(&self, k: usize) -> u32 {
        (0..self.n_classes).map(|t| self.get(t, k)).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerClassStats {
    /// `TP / (TP + FP)`, 0 si no hubo predicciones de la clase.
    pub precision: f64,
    /// `TP / (TP + FN)`, 0 sin soporte.
    pub recall: f64,
    pub f1: f64,
    pub support: u32,
}

pub fn precision_recall_by_class(cm: &ConfusionMatrix) -> Vec<PerClassStats> {
    let k = cm.n_classes;
    let mut stats = Vec::with_capacity(k);
    for class_idx in 0..k {
        let tp = cm.get(class_idx, class_idx) as f64;
        let mut fp = 0f64;
        let mut fn_ = 0f64;
        let mut support = 0u32;
        for j in 0..k {
            let v = cm.get(class_idx, j);
            support = support.saturating_add(v);
            if j != class_idx {
                fn_ += v as f64;
            }
        }
        for i in 0..k {
            if i != class_idx {
                fp += cm.get(i, class_idx) as f64;
            }
        }
        let precision = if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) };
        let recall = if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) };
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        stats.push(PerClassStats { precision,
                                   recall,
                                   f1,
                                   support });
    }
    stats
}

pub fn accuracy(cm: &ConfusionMatrix) -> f64 {
    let mut correct = 0u64;
    let mut total = 0u64;
    for truth in 0..cm.n_classes {
        for predicted in 0..cm.n_classes {
            let v = cm.get(truth, predicted) as u64;
            total += v;
            if truth == predicted {
                correct += v;
            }
        }
    }
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    }
}

/// Promedios `(precision, recall, f1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Averages {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Promedio macro sobre las clases presentes en la verdad o en las
/// predicciones.
pub fn macro_average(cm: &ConfusionMatrix, stats: &[PerClassStats]) -> Averages {
    let present: Vec<&PerClassStats> = stats.iter()
                                            .enumerate()
                                            .filter(|(k, s)| s.support > 0 || cm.predicted(*k) > 0)
                                            .map(|(_, s)| s)
                                            .collect();
    let n = present.len().max(1) as f64;
    Averages { precision: present.iter().map(|s| s.precision).sum::<f64>() / n,
               recall: present.iter().map(|s| s.recall).sum::<f64>() / n,
               f1: present.iter().map(|s| s.f1).sum::<f64>() / n }
}

/// Promedio ponderado por soporte.
pub fn weighted_average(stats: &[PerClassStats]) -> Averages {
    let total: u32 = stats.iter().map(|s| s.support).sum();
    if total == 0 {
        return Averages { precision: 0.0,
                          recall: 0.0,
                          f1: 0.0 };
    }
    let w = |f: fn(&PerClassStats) -> f64| stats.iter().map(|s| f(s) * s.support as f64).sum::<f64>() / total as f64;
    Averages { precision: w(|s| s.precision),
               recall: w(|s| s.recall),
               f1: w(|s| s.f1) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_class_example() {
        // verdad:    0 0 1 1 2 2
        // predicho:  0 1 1 1 2 0
        let cm = ConfusionMatrix::from_predictions(3, &[0, 0, 1, 1, 2, 2], &[0, 1, 1, 1, 2, 0]);
        assert!((accuracy(&cm) - 4.0 / 6.0).abs() < 1e-12);
        let stats = precision_recall_by_class(&cm);
        assert_eq!(stats[1].precision, 2.0 / 3.0);
        assert_eq!(stats[1].recall, 1.0);
        assert_eq!(stats[2].precision, 1.0);
        assert_eq!(stats[2].recall, 0.5);
        let m = macro_average(&cm, &stats);
        assert!((m.recall - (0.5 + 1.0 + 0.5) / 3.0).abs() < 1e-12);
        assert_eq!(cm.rows(), vec![vec![1, 1, 0], vec![0, 2, 0], vec![1, 0, 1]]);
    }

    #[test]
    fn absent_class_does_not_drag_macro_average() {
        let cm = ConfusionMatrix::from_predictions(3, &[0, 1], &[0, 1]);
        let stats = precision_recall_by_class(&cm);
        assert_eq!(macro_average(&cm, &stats).precision, 1.0);
        assert_eq!(weighted_average(&stats).f1, 1.0);
    }
}
