use serde_json::Value;

use crate::errors::StageError;
use crate::model::{ArtifactKind, ArtifactSpec, Provenance};

/// Output producido por un stage, aún sin guardar.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub slot: &'static str,
    pub kind: ArtifactKind,
    pub payload: Value,
    pub provenance: Provenance,
}

/// Hito ligero que no altera el resultado (p. ej. uso del fallback).
#[derive(Debug, Clone, PartialEq)]
pub struct StageSignal {
    pub signal: String,
    pub data: Value,
}

/// Resultado de una ejecución exitosa.
#[derive(Debug, Clone, Default)]
pub struct StageRun {
    pub outputs: Vec<StageOutput>,
    pub signals: Vec<StageSignal>,
}

impl StageRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Añade un output tipado.
    pub fn output<T: ArtifactSpec>(mut self, slot: &'static str, value: &T, provenance: Provenance) -> Result<Self, StageError> {
        self.outputs.push(StageOutput { slot,
                                        kind: T::KIND,
                                        payload: value.to_payload()?,
                                        provenance });
        Ok(self)
    }

    pub fn signal(mut self, signal: &str, data: Value) -> Self {
        self.signals.push(StageSignal { signal: signal.to_string(),
                                        data });
        self
    }

    pub fn output_for(&self, slot: &str) -> Option<&StageOutput> {
        self.outputs.iter().find(|o| o.slot == slot)
    }
}
