//! Estandarización por columna (media cero, varianza unitaria).

use serde::{Deserialize, Serialize};

/// Media y escala por columna. La escala es la desviación estándar
/// poblacional, o 1 si la columna es constante.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerStats {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl ScalerStats {
    /// Ajusta sobre `rows`. Sin filas devuelve media 0 y escala 1.
    pub fn fit(rows: &[Vec<f64>], width: usize) -> Self {
        let n = rows.len() as f64;
        let mut mean = vec![0.0; width];
        if rows.is_empty() {
            return Self { mean,
                          scale: vec![1.0; width] };
        }
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = vec![0.0; width];
        for row in rows {
            for ((s, v), m) in var.iter_mut().zip(row).zip(&mean) {
                *s += (v - m) * (v - m);
            }
        }
        let scale = var.into_iter()
                       .map(|s| {
                           let sd = (s / n).sqrt();
                           if sd > f64::EPSILON { sd } else { 1.0 }
                       })
                       .collect();
        Self { mean, scale }
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
           .zip(self.mean.iter().zip(&self.scale))
           .map(|(v, (m, s))| (v - m) / s)
           .collect()
    }

    pub fn transform_all(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}

/// Media y varianza poblacional de cada columna.
pub fn column_moments(rows: &[Vec<f64>], width: usize) -> Vec<(f64, f64)> {
    let n = rows.len().max(1) as f64;
    (0..width).map(|j| {
                  let mean = rows.iter().map(|r| r[j]).sum::<f64>() / n;
                  let var = rows.iter().map(|r| (r[j] - mean) * (r[j] - mean)).sum::<f64>() / n;
                  (mean, var)
              })
              .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transformed_fit_rows_have_zero_mean_unit_variance() {
        let rows = vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 60.0]];
        let stats = ScalerStats::fit(&rows, 2);
        let scaled = stats.transform_all(&rows);
        for (m, v) in column_moments(&scaled, 2) {
            assert!(m.abs() < 1e-12);
            assert!((v - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn constant_column_keeps_unit_scale() {
        let stats = ScalerStats::fit(&[vec![5.0], vec![5.0]], 1);
        assert_eq!(stats.scale, vec![1.0]);
        assert_eq!(stats.transform(&[7.0]), vec![2.0]);
    }
}
