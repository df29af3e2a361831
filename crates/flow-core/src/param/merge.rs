//! Fusión determinista de capas de parámetros.
//!
//! Merge shallow: las claves de `top` reemplazan a las de `base`. Se usa para
//! aplicar, en orden fijo, los valores compilados y luego los de submission.

use super::ParamOverrides;

pub fn merge_overrides(base: &ParamOverrides, top: &ParamOverrides) -> ParamOverrides {
    let mut out = base.clone();
    for (k, v) in top {
        out.insert(k.clone(), v.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::ParamValue;

    #[test]
    fn top_layer_wins() {
        let base: ParamOverrides = [("seed".to_string(), ParamValue::Int(42)), ("treeCount".to_string(), ParamValue::Int(100))].into();
        let top: ParamOverrides = [("seed".to_string(), ParamValue::Int(7))].into();
        let merged = merge_overrides(&base, &top);
        assert_eq!(merged["seed"], ParamValue::Int(7));
        assert_eq!(merged["treeCount"], ParamValue::Int(100));
    }
}
