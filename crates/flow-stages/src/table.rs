//! Lectura de datasets CSV a `DatasetTable`.
//!
//! Formato esperado: cabecera, columnas numéricas de features y una columna
//! de etiqueta (`target` si existe, si no la última). Celdas vacías o
//! `NA`/`NaN`/`null`/`?` cuentan como ausentes.

use crate::artifacts::DatasetTable;
use crate::errors::ExtractionError;

pub const LABEL_COLUMN: &str = "target";

const MISSING: &[&str] = &["", "na", "nan", "null", "none", "?"];

fn is_missing(cell: &str) -> bool {
    let c = cell.trim();
    MISSING.iter().any(|m| c.eq_ignore_ascii_case(m))
}

fn split_record(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                cur.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => out.push(std::mem::take(&mut cur)),
            _ => cur.push(c),
        }
    }
    out.push(cur);
    out
}

/// Parsea `text` como tabla de clasificación.
pub fn parse_csv(text: &str) -> Result<DatasetTable, ExtractionError> {
    let mut lines = text.lines().map(|l| l.trim_end_matches('\r')).filter(|l| !l.trim().is_empty());
    let header: Vec<String> = match lines.next() {
        Some(h) => split_record(h).into_iter().map(|c| c.trim().to_string()).collect(),
        None => return Err(ExtractionError::Parse("empty file".into())),
    };
    if header.len() < 2 {
        return Err(ExtractionError::Parse("need at least one feature and a label column".into()));
    }
    let label_idx = header.iter()
                          .position(|h| h == LABEL_COLUMN)
                          .unwrap_or(header.len() - 1);

    let mut features = Vec::new();
    let mut raw_labels: Vec<Option<String>> = Vec::new();
    for (n, line) in lines.enumerate() {
        let cells = split_record(line);
        if cells.len() != header.len() {
            return Err(ExtractionError::Parse(format!("line {}: {} cells, header has {}",
                                                      n + 2,
                                                      cells.len(),
                                                      header.len())));
        }
        let mut row = Vec::with_capacity(header.len() - 1);
        for (j, cell) in cells.iter().enumerate() {
            if j == label_idx {
                continue;
            }
            if is_missing(cell) {
                row.push(None);
            } else {
                let v = cell.trim()
                            .parse::<f64>()
                            .map_err(|_| ExtractionError::Parse(format!("line {}: `{}` is not numeric", n + 2, cell.trim())))?;
                row.push(Some(v));
            }
        }
        features.push(row);
        let label = &cells[label_idx];
        raw_labels.push(if is_missing(label) { None } else { Some(label.trim().to_string()) });
    }
    if features.is_empty() {
        return Err(ExtractionError::Parse("no data rows".into()));
    }

    let (class_names, numeric) = encode_classes(&raw_labels);
    let labels = raw_labels.iter()
                           .map(|l| {
                               l.as_ref().and_then(|l| {
                                              let key = if numeric { normalize(l) } else { l.clone() };
                                              class_names.iter().position(|c| *c == key)
                                          })
                           })
                           .collect();
    let feature_names = header.iter()
                              .enumerate()
                              .filter(|(j, _)| *j != label_idx)
                              .map(|(_, h)| h.clone())
                              .collect();
    Ok(DatasetTable::new(feature_names, header[label_idx].clone(), class_names, features, labels))
}

fn normalize(label: &str) -> String {
    label.parse::<f64>().map_or_else(|_| label.to_string(), |v| v.to_string())
}

/// Clases distintas en orden numérico si todas son números, si no léxico.
/// Etiquetas numéricas equivalentes (`1` y `1.0`) se normalizan.
fn encode_classes(raw: &[Option<String>]) -> (Vec<String>, bool) {
    let mut names: Vec<String> = raw.iter().flatten().cloned().collect();
    let numeric: Option<Vec<f64>> = names.iter().map(|n| n.parse::<f64>().ok()).collect();
    match numeric {
        Some(mut values) => {
            values.sort_by(f64::total_cmp);
            values.dedup();
            (values.into_iter().map(|v| v.to_string()).collect(), true)
        }
        None => {
            names.sort();
            names.dedup();
            (names, false)
        }
    }
}
