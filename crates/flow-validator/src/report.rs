use std::fmt::Write as _;

use crate::StructuralValidationError;

/// Resumen legible del documento.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Summary {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sdk_version: Option<String>,
    pub component_count: usize,
    pub execution_step_count: usize,
}

/// Veredicto de la validación.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    pub errors: Vec<StructuralValidationError>,
    pub warnings: Vec<String>,
    pub summary: Summary,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    /// `0` válido, `1` cualquier error.
    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }

    /// Primer error, para callers que sólo quieren un `Result`.
    pub fn into_result(self) -> Result<Summary, StructuralValidationError> {
        match self.errors.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(self.summary),
        }
    }

    pub fn render(&self) -> String {
        let s = &self.summary;
        let mut out = String::new();
        let _ = writeln!(out, "Pipeline: {}", s.name.as_deref().unwrap_or("<unnamed>"));
        if let Some(d) = &s.description {
            let _ = writeln!(out, "Description: {d}");
        }
        if let Some(v) = &s.sdk_version {
            let _ = writeln!(out, "SDK version: {v}");
        }
        let _ = writeln!(out, "Components: {}", s.component_count);
        let _ = writeln!(out, "Execution steps: {}", s.execution_step_count);
        for w in &self.warnings {
            let _ = writeln!(out, "WARNING: {w}");
        }
        for e in &self.errors {
            let _ = writeln!(out, "ERROR: {e}");
        }
        let _ = writeln!(out, "{}", if self.passed() { "PASS: pipeline is structurally valid" } else { "FAIL: pipeline is not valid" });
        out
    }
}
