//! Reconstrucción del estado de un run a partir de sus eventos.
//!
//! Replay lineal: consume los eventos en orden de `seq` y actualiza un
//! `RunState`. Máquina de estados del run:
//! `Pending -> Running(tarea) -> {Succeeded | Failed}`; `Failed` y
//! `Succeeded` son terminales y los eventos posteriores se ignoran.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use flow_core::{ArtifactRef, ParamValue};
use serde::Serialize;
use uuid::Uuid;

use crate::event::{RunEvent, RunEventKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running { task: String },
    Succeeded,
    Failed { task: String, code: String, message: String },
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Succeeded | RunStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskStatus {
    Running,
    Succeeded,
    Failed,
}

/// Estado de una tarea que llegó a emitir eventos.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSlot {
    pub task: String,
    pub index: usize,
    pub status: TaskStatus,
    pub fingerprint: Option<String>,
    pub outputs: BTreeMap<String, ArtifactRef>,
    pub signals: Vec<(String, serde_json::Value)>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl TaskSlot {
    fn new(task: &str, index: usize) -> Self {
        Self { task: task.to_string(),
               index,
               status: TaskStatus::Running,
               fingerprint: None,
               outputs: BTreeMap::new(),
               signals: Vec::new(),
               started_at: None,
               finished_at: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunState {
    pub run_id: Uuid,
    pub pipeline: String,
    pub document_digest: String,
    pub task_count: usize,
    pub parameters: BTreeMap<String, ParamValue>,
    pub status: RunStatus,
    pub tasks: Vec<TaskSlot>,
    pub run_fingerprint: Option<String>,
}

impl RunState {
    pub fn task(&self, name: &str) -> Option<&TaskSlot> {
        self.tasks.iter().find(|t| t.task == name)
    }

    /// Output `slot` producido por la tarea `task`.
    pub fn output(&self, task: &str, slot: &str) -> Option<&ArtifactRef> {
        self.task(task).and_then(|t| t.outputs.get(slot))
    }

    fn slot_mut(&mut self, task: &str, index: usize) -> &mut TaskSlot {
        match self.tasks.iter().position(|t| t.task == task) {
            Some(pos) => &mut self.tasks[pos],
            None => {
                self.tasks.push(TaskSlot::new(task, index));
                let last = self.tasks.len() - 1;
                &mut self.tasks[last]
            }
        }
    }
}

/// Reconstruye el run. `None` si falta `RunInitialized` como primer evento.
pub fn replay(events: &[RunEvent]) -> Option<RunState> {
    let (first, rest) = events.split_first()?;
    let RunEventKind::RunInitialized { pipeline, document_digest, task_count, parameters } = &first.kind else {
        return None;
    };
    let mut state = RunState { run_id: first.run_id,
                               pipeline: pipeline.clone(),
                               document_digest: document_digest.clone(),
                               task_count: *task_count,
                               parameters: parameters.clone(),
                               status: RunStatus::Pending,
                               tasks: Vec::new(),
                               run_fingerprint: None };
    for ev in rest {
        if state.status.is_terminal() {
            break;
        }
        match &ev.kind {
            RunEventKind::RunInitialized { .. } => {}
            RunEventKind::StageStarted { task_index, task } => {
                let slot = state.slot_mut(task, *task_index);
                slot.status = TaskStatus::Running;
                slot.started_at = Some(ev.ts);
                state.status = RunStatus::Running { task: task.clone() };
            }
            RunEventKind::StageSignal { task_index, task, signal, data } => {
                state.slot_mut(task, *task_index)
                     .signals
                     .push((signal.clone(), data.clone()));
            }
            RunEventKind::StageFinished { task_index, task, outputs, fingerprint } => {
                let slot = state.slot_mut(task, *task_index);
                slot.status = TaskStatus::Succeeded;
                slot.outputs = outputs.clone();
                slot.fingerprint = Some(fingerprint.clone());
                slot.finished_at = Some(ev.ts);
            }
            RunEventKind::StageFailed { task_index, task, code, message, fingerprint } => {
                let slot = state.slot_mut(task, *task_index);
                slot.status = TaskStatus::Failed;
                slot.fingerprint = Some(fingerprint.clone());
                slot.finished_at = Some(ev.ts);
                state.status = RunStatus::Failed { task: task.clone(),
                                                   code: code.clone(),
                                                   message: message.clone() };
            }
            RunEventKind::RunCompleted { run_fingerprint } => {
                state.run_fingerprint = Some(run_fingerprint.clone());
                state.status = RunStatus::Succeeded;
            }
        }
    }
    Some(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventStore, InMemoryEventStore};

    fn init(store: &mut InMemoryEventStore, run: Uuid) {
        store.append_kind(run,
                          RunEventKind::RunInitialized { pipeline: "p".into(),
                                                         document_digest: "sha256:0".into(),
                                                         task_count: 2,
                                                         parameters: BTreeMap::new() });
    }

    #[test]
    fn walks_the_state_machine() {
        let mut store = InMemoryEventStore::new();
        let run = Uuid::new_v4();
        init(&mut store, run);
        assert_eq!(replay(&store.list(run)).map(|s| s.status), Some(RunStatus::Pending));

        store.append_kind(run, RunEventKind::StageStarted { task_index: 0, task: "a".into() });
        let state = replay(&store.list(run)).unwrap();
        assert_eq!(state.status, RunStatus::Running { task: "a".into() });
        assert_eq!(state.task("a").map(|t| t.status), Some(TaskStatus::Running));

        store.append_kind(run,
                          RunEventKind::StageFinished { task_index: 0,
                                                        task: "a".into(),
                                                        outputs: BTreeMap::new(),
                                                        fingerprint: "fa".into() });
        store.append_kind(run, RunEventKind::StageStarted { task_index: 1, task: "b".into() });
        store.append_kind(run,
                          RunEventKind::StageFinished { task_index: 1,
                                                        task: "b".into(),
                                                        outputs: BTreeMap::new(),
                                                        fingerprint: "fb".into() });
        store.append_kind(run, RunEventKind::RunCompleted { run_fingerprint: "run".into() });
        let state = replay(&store.list(run)).unwrap();
        assert_eq!(state.status, RunStatus::Succeeded);
        assert_eq!(state.run_fingerprint.as_deref(), Some("run"));
        assert_eq!(state.tasks.len(), 2);
    }

    #[test]
    fn failure_is_terminal() {
        let mut store = InMemoryEventStore::new();
        let run = Uuid::new_v4();
        init(&mut store, run);
        store.append_kind(run, RunEventKind::StageStarted { task_index: 0, task: "a".into() });
        store.append_kind(run,
                          RunEventKind::StageFailed { task_index: 0,
                                                      task: "a".into(),
                                                      code: "DegenerateDataError".into(),
                                                      message: "boom".into(),
                                                      fingerprint: "fa".into() });
        store.append_kind(run, RunEventKind::RunCompleted { run_fingerprint: "run".into() });
        let state = replay(&store.list(run)).unwrap();
        assert!(matches!(state.status, RunStatus::Failed { ref code, .. } if code == "DegenerateDataError"));
        assert!(state.run_fingerprint.is_none());
    }

    #[test]
    fn requires_initialization_first() {
        let mut store = InMemoryEventStore::new();
        let run = Uuid::new_v4();
        assert!(replay(&store.list(run)).is_none());
        store.append_kind(run, RunEventKind::StageStarted { task_index: 0, task: "a".into() });
        assert!(replay(&store.list(run)).is_none());
    }
}
