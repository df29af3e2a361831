//! Partición train/test estratificada y determinista.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SplitError {
    #[error("test fraction {0} outside (0, 1)")]
    Fraction(f64),
    #[error("cannot split {rows} row(s) with test fraction {fraction}: both partitions need at least one row")]
    TooFewRows { rows: usize, fraction: f64 },
}

/// Índices de filas de cada partición, en orden ascendente.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Tamaño de la partición de test: `ceil(fraction * rows)`.
pub fn test_size(rows: usize, fraction: f64) -> usize {
    (fraction * rows as f64).ceil() as usize
}

/// Split estratificado por etiqueta.
///
/// Las cuotas por clase se reparten por resto mayor (empates: clase de menor
/// índice) y dentro de cada clase las filas se barajan con `StdRng` sembrado
/// con `seed`. Mismo `(labels, fraction, seed)` => misma partición.
pub fn stratified_split(labels: &[usize], fraction: f64, seed: u64) -> Result<Split, SplitError> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(SplitError::Fraction(fraction));
    }
    let n = labels.len();
    let n_test = test_size(n, fraction);
    if n_test == 0 || n_test >= n {
        return Err(SplitError::TooFewRows { rows: n,
                                            fraction });
    }

    let n_classes = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (i, &l) in labels.iter().enumerate() {
        by_class[l].push(i);
    }
    let quotas = class_quotas(&by_class.iter().map(Vec::len).collect::<Vec<_>>(), n_test);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);
    for (members, quota) in by_class.iter_mut().zip(quotas) {
        members.shuffle(&mut rng);
        test.extend_from_slice(&members[..quota]);
        train.extend_from_slice(&members[quota..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    Ok(Split { train, test })
}

fn class_quotas(counts: &[usize], n_test: usize) -> Vec<usize> {
    let n: usize = counts.iter().sum();
    let exact: Vec<f64> = counts.iter().map(|&c| c as f64 * n_test as f64 / n as f64).collect();
    let mut quotas: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();
    let mut remaining = n_test - quotas.iter().sum::<usize>();

    let mut by_remainder: Vec<usize> = (0..counts.len()).collect();
    by_remainder.sort_by(|&a, &b| {
                    let ra = exact[a] - exact[a].floor();
                    let rb = exact[b] - exact[b].floor();
                    rb.total_cmp(&ra).then(a.cmp(&b))
                });
    // una vuelta basta salvo clases saturadas; se repite hasta repartir todo
    while remaining > 0 {
        let before = remaining;
        for &c in &by_remainder {
            if remaining == 0 {
                break;
            }
            if quotas[c] < counts[c] {
                quotas[c] += 1;
                remaining -= 1;
            }
        }
        if remaining == before {
            break;
        }
    }
    quotas
}
