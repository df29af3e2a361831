//! Eventos de un run y store append-only.
//!
//! Cada `submit` emite eventos a un `EventStore`; el estado observable del
//! run (`RunStatus`) se reconstruye por replay, sin estructuras mutables
//! aparte. El enum `RunEventKind` es el contrato estable del runtime.
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use flow_core::{ArtifactRef, ParamValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunEventKind {
    /// Primer evento de un `run_id`: fija el documento y los parámetros
    /// resueltos.
    RunInitialized {
        pipeline: String,
        document_digest: String,
        task_count: usize,
        parameters: BTreeMap<String, ParamValue>,
    },
    /// La tarea recibió todos sus inputs y comenzó. No implica éxito.
    StageStarted { task_index: usize, task: String },
    /// Hito ligero emitido por el stage (p. ej. uso del dataset de respaldo).
    StageSignal {
        task_index: usize,
        task: String,
        signal: String,
        data: serde_json::Value,
    },
    StageFinished {
        task_index: usize,
        task: String,
        outputs: BTreeMap<String, ArtifactRef>,
        fingerprint: String,
    },
    /// Error terminal; el run no continúa.
    StageFailed {
        task_index: usize,
        task: String,
        code: String,
        message: String,
        fingerprint: String,
    },
    /// Cierre tras la tarea terminal, con el hash de los fingerprints de
    /// cada tarea en orden.
    RunCompleted { run_fingerprint: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    pub seq: u64,
    pub run_id: Uuid,
    pub kind: RunEventKind,
    pub ts: DateTime<Utc>, // no entra en fingerprints
}

/// Almacenamiento de eventos append-only.
pub trait EventStore {
    /// Agrega un evento y devuelve el evento completo (con seq y ts).
    fn append_kind(&mut self, run_id: Uuid, kind: RunEventKind) -> RunEvent;
    /// Eventos de un run en orden ascendente de seq.
    fn list(&self, run_id: Uuid) -> Vec<RunEvent>;
    /// Runs conocidos, en orden de creación.
    fn runs(&self) -> Vec<Uuid>;
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    inner: HashMap<Uuid, Vec<RunEvent>>,
    order: Vec<Uuid>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, run_id: Uuid, kind: RunEventKind) -> RunEvent {
        if !self.inner.contains_key(&run_id) {
            self.order.push(run_id);
        }
        let events = self.inner.entry(run_id).or_default();
        let ev = RunEvent { seq: events.len() as u64,
                            run_id,
                            kind,
                            ts: Utc::now() };
        events.push(ev.clone());
        ev
    }

    fn list(&self, run_id: Uuid) -> Vec<RunEvent> {
        self.inner.get(&run_id).cloned().unwrap_or_default()
    }

    fn runs(&self) -> Vec<Uuid> {
        self.order.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_per_run_and_monotonic() {
        let mut store = InMemoryEventStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.append_kind(a, RunEventKind::StageStarted { task_index: 0, task: "x".into() });
        store.append_kind(b, RunEventKind::StageStarted { task_index: 0, task: "x".into() });
        let ev = store.append_kind(a, RunEventKind::RunCompleted { run_fingerprint: "f".into() });
        assert_eq!(ev.seq, 1);
        assert_eq!(store.list(a).len(), 2);
        assert_eq!(store.list(b)[0].seq, 0);
        assert_eq!(store.runs(), vec![a, b]);
        assert!(store.list(Uuid::new_v4()).is_empty());
    }
}
