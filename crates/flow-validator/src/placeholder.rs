/// Valores que, completos, delatan un template sin resolver.
pub const PLACEHOLDER_TOKENS: &[&str] = &["PLACEHOLDER", "TODO", "CHANGEME", "TBD"];

/// Fragmentos que delatan un template sin resolver en cualquier posición.
pub const PLACEHOLDER_MARKERS: &[&str] = &["{{", "}}", "${", "YOUR_USERNAME"];

/// `true` si `value` es (o contiene) un placeholder.
pub fn is_placeholder(value: &str) -> bool {
    let v = value.trim();
    PLACEHOLDER_TOKENS.iter().any(|t| v.eq_ignore_ascii_case(t)) || PLACEHOLDER_MARKERS.iter().any(|m| v.contains(m))
}
