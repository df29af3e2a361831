//! Forma canónica de un `Value` y su hash blake3.
//!
//! La forma canónica (claves ordenadas por bytes, sin espacios) es la base
//! de locators, contratos y fingerprints. `hash_value` la emite directamente
//! sobre el hasher, sin construir el texto intermedio.

use blake3::Hasher;
use serde_json::Value;

/// Destino de la emisión canónica.
trait Sink {
    fn put(&mut self, chunk: &str);
}

impl Sink for String {
    fn put(&mut self, chunk: &str) {
        self.push_str(chunk);
    }
}

impl Sink for Hasher {
    fn put(&mut self, chunk: &str) {
        self.update(chunk.as_bytes());
    }
}

fn emit<S: Sink>(value: &Value, out: &mut S) {
    match value {
        Value::Array(items) => {
            out.put("[");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.put(",");
                }
                emit(item, out);
            }
            out.put("]");
        }
        Value::Object(map) => {
            // no depender de que `Map` venga ordenado (feature preserve_order)
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            out.put("{");
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.put(",");
                }
                out.put(&Value::from(key.as_str()).to_string());
                out.put(":");
                emit(item, out);
            }
            out.put("}");
        }
        // escalares: `Display` de `Value` ya es JSON compacto y escapado
        scalar => out.put(&scalar.to_string()),
    }
}

pub fn to_canonical_json(value: &Value) -> String {
    let mut text = String::new();
    emit(value, &mut text);
    text
}

/// Hex blake3 de `input`.
pub fn hash_str(input: &str) -> String {
    blake3::hash(input.as_bytes()).to_hex().to_string()
}

/// Hash de la forma canónica: el orden de inserción de las claves no cuenta.
pub fn hash_value(value: &Value) -> String {
    let mut hasher = Hasher::new();
    emit(value, &mut hasher);
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_objects_inside_arrays_are_sorted() {
        let v = json!([{"z": 1, "a": {"d": false, "c": null}}, "s", 1.5]);
        assert_eq!(to_canonical_json(&v), r#"[{"a":{"c":null,"d":false},"z":1},"s",1.5]"#);
    }

    #[test]
    fn keys_and_strings_are_escaped() {
        let v = json!({"clave \"q\"": "línea\nnueva"});
        assert_eq!(to_canonical_json(&v), r#"{"clave \"q\"":"línea\nnueva"}"#);
    }

    #[test]
    fn streamed_hash_equals_hash_of_text() {
        let v = json!({"seed": 42, "stage": "model-training", "inputs": {"train_data": "ab12"}});
        assert_eq!(hash_value(&v), hash_str(&to_canonical_json(&v)));
    }

    #[test]
    fn empty_containers() {
        assert_eq!(to_canonical_json(&json!({"a": [], "b": {}})), r#"{"a":[],"b":{}}"#);
    }
}
