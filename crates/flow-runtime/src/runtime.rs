use std::collections::BTreeMap;

use flow_compiler::document::TaskSpec;
use flow_compiler::{digest, CompiledDocument, Compiler};
use flow_core::constants::ENGINE_VERSION;
use flow_core::hashing::hash_value;
use flow_core::param::merge_overrides;
use flow_core::{ArtifactRef, ArtifactSpec, ArtifactStore, ParamOverrides, ParamSpec, ParamValue, ParameterError,
                ResolvedParams, StageContext, StageDefinition, StageError, StoreError};
use log::{debug, info, warn};
use serde_json::json;
use uuid::Uuid;

use crate::error::RuntimeError;
use crate::event::{EventStore, InMemoryEventStore, RunEventKind};
use crate::registry::StageRegistry;
use crate::replay::{replay, RunState, RunStatus};

/// Frontera con el runtime de ejecución: recibe un documento compilado y un
/// mapa nombre -> valor de parámetros, devuelve un identificador de run.
///
/// Los rechazos previos a ejecutar (documento inválido, parámetros fuera de
/// dominio) son `Err`; los fallos de stage quedan en el estado del run.
pub trait RunSubmitter {
    fn submit(&mut self, doc: &CompiledDocument, params: &ParamOverrides) -> Result<Uuid, RuntimeError>;

    fn status(&self, run_id: Uuid) -> Result<RunStatus, RuntimeError>;
}

/// Runtime síncrono en proceso. Ejecuta las tareas en el orden del documento
/// (topológico) y pasa artifacts por referencia a través de `S`.
#[derive(Debug)]
pub struct LocalRuntime<S: ArtifactStore, E: EventStore = InMemoryEventStore> {
    registry: StageRegistry,
    store: S,
    events: E,
}

/// Tarea lista para ejecutar: stage resuelto y parámetros propios.
struct Plan<'a> {
    task: &'a TaskSpec,
    stage: &'a dyn StageDefinition,
    params: ResolvedParams,
}

impl<S: ArtifactStore> LocalRuntime<S, InMemoryEventStore> {
    pub fn new(registry: StageRegistry, store: S) -> Self {
        Self::with_events(registry, store, InMemoryEventStore::new())
    }
}

impl<S: ArtifactStore, E: EventStore> LocalRuntime<S, E> {
    pub fn with_events(registry: StageRegistry, store: S, events: E) -> Self {
        Self { registry,
               store,
               events }
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    /// Estado completo del run (tareas, outputs, fingerprints).
    pub fn state(&self, run_id: Uuid) -> Result<RunState, RuntimeError> {
        replay(&self.events.list(run_id)).ok_or(RuntimeError::UnknownRun(run_id))
    }

    /// Decodifica un artifact producido por algún run.
    pub fn load<T: ArtifactSpec>(&self, artifact: &ArtifactRef) -> Result<T, StageError> {
        let payload = self.store.get(artifact)?;
        Ok(T::from_payload(artifact.kind(), payload)?)
    }

    /// Ejecuta un único componente fuera de un run. Los inputs se dan por
    /// locator y deben existir en el store con el kind declarado; los
    /// parámetros no provistos toman su default.
    pub fn run_stage(&mut self,
                     component: &str,
                     inputs: &BTreeMap<String, String>,
                     params: &ParamOverrides)
                     -> Result<BTreeMap<String, ArtifactRef>, RuntimeError> {
        let stage = self.registry
                        .get(component)
                        .ok_or_else(|| RuntimeError::UnknownComponent { task: component.to_string(),
                                                                       component: component.to_string() })?;
        let declared = stage.inputs();
        if let Some(extra) = inputs.keys().find(|k| !declared.iter().any(|s| s.name == k.as_str())) {
            return Err(RuntimeError::UnexpectedInput { task: stage.id().to_string(),
                                                       input: extra.clone() });
        }
        let mut refs = BTreeMap::new();
        for slot in declared {
            let locator = inputs.get(slot.name)
                                .ok_or_else(|| RuntimeError::MissingInput { task: stage.id().to_string(),
                                                                            input: slot.name.to_string() })?;
            let artifact = self.store.describe(locator)?;
            if artifact.kind() != slot.kind {
                return Err(StoreError::KindMismatch { locator: locator.clone(),
                                                      expected: slot.kind,
                                                      found: artifact.kind() }.into());
            }
            refs.insert(slot.name.to_string(), artifact);
        }
        let resolved = ResolvedParams::resolve(&stage.parameters(), params)?;

        info!("stage `{}` started", stage.id());
        let run = {
            let ctx = StageContext::new(stage.id(), refs, resolved, &self.store);
            stage.run(&ctx)
        };
        let run = run.map_err(|source| RuntimeError::Stage { stage: stage.id().to_string(),
                                                             source })?;
        for s in &run.signals {
            info!("stage `{}` signal `{}`: {}", stage.id(), s.signal, s.data);
        }
        let mut outputs = BTreeMap::new();
        for out in run.outputs {
            let artifact = self.store.put(out.kind, stage.id(), out.provenance, out.payload)?;
            outputs.insert(out.slot.to_string(), artifact);
        }
        info!("stage `{}` finished with {} output(s)", stage.id(), outputs.len());
        Ok(outputs)
    }

    fn gate(&self, doc: &CompiledDocument) -> Result<(), RuntimeError> {
        let report = flow_validator::validate_value(&serde_json::to_value(doc)?);
        for w in &report.warnings {
            warn!("{w}");
        }
        if report.passed() {
            Ok(())
        } else {
            Err(RuntimeError::Rejected(report.errors))
        }
    }

    /// Resuelve stage y parámetros de cada tarea antes de ejecutar nada.
    fn plan<'a>(&'a self,
                doc: &'a CompiledDocument,
                submitted: &ParamOverrides)
                -> Result<(Vec<Plan<'a>>, ResolvedParams), RuntimeError> {
        let mut specs: BTreeMap<String, ParamSpec> = BTreeMap::new();
        let mut stages = Vec::with_capacity(doc.root.dag.tasks.len());
        for task in &doc.root.dag.tasks {
            let stage = self.registry
                            .get(&task.component_ref)
                            .ok_or_else(|| RuntimeError::UnknownComponent { task: task.name.clone(),
                                                                           component: task.component_ref.clone() })?;
            let component = doc.components
                               .get(&task.component_ref)
                               .ok_or_else(|| RuntimeError::Document(format!("task `{}` references missing component `{}`",
                                                                             task.name, task.component_ref)))?;
            if component.contract != stage.contract_hash() {
                return Err(RuntimeError::ContractMismatch(task.component_ref.clone()));
            }
            for mut spec in stage.parameters() {
                spec.name = pipeline_param(task, &spec.name).to_string();
                specs.entry(spec.name.clone()).or_insert(spec);
            }
            stages.push((task, stage));
        }

        let mut compiled = ParamOverrides::new();
        for (name, def) in &doc.root.input_definitions {
            let value: ParamValue = serde_json::from_value(def.value.clone())
                .map_err(|e| RuntimeError::Document(format!("input definition `{name}`: {e}")))?;
            compiled.insert(name.clone(), value);
        }
        if let Some(unknown) = submitted.keys().find(|k| !specs.contains_key(*k)) {
            return Err(ParameterError::Unknown { name: unknown.clone() }.into());
        }
        let specs: Vec<ParamSpec> = specs.into_values().collect();
        let resolved = ResolvedParams::resolve(&specs, &merge_overrides(&compiled, submitted))?;

        let mut plans = Vec::with_capacity(stages.len());
        for (task, stage) in stages {
            let mut own = ParamOverrides::new();
            for spec in stage.parameters() {
                own.insert(spec.name.clone(), resolved.get(pipeline_param(task, &spec.name))?.clone());
            }
            let params = ResolvedParams::resolve(&stage.parameters(), &own)?;
            plans.push(Plan { task, stage, params });
        }
        Ok((plans, resolved))
    }

    fn fail(&mut self, run_id: Uuid, index: usize, task: &str, error: &StageError, fingerprint: String) {
        warn!("run {run_id}: task `{task}` failed: {error}");
        self.events
            .append_kind(run_id,
                         RunEventKind::StageFailed { task_index: index,
                                                     task: task.to_string(),
                                                     code: error.code().to_string(),
                                                     message: error.to_string(),
                                                     fingerprint });
    }
}

/// Parámetro del pipeline ligado al parámetro `name` de la tarea.
fn pipeline_param<'a>(task: &'a TaskSpec, name: &'a str) -> &'a str {
    task.inputs.parameters.get(name).map(String::as_str).unwrap_or(name)
}

fn locators(refs: &BTreeMap<String, ArtifactRef>) -> BTreeMap<&str, &str> {
    refs.iter().map(|(k, v)| (k.as_str(), v.locator())).collect()
}

fn task_fingerprint(index: usize,
                    plan: &Plan<'_>,
                    inputs: &BTreeMap<String, ArtifactRef>,
                    outputs: &BTreeMap<String, ArtifactRef>)
                    -> String {
    hash_value(&json!({
        "engine_version": ENGINE_VERSION,
        "task_index": index,
        "task": plan.task.name,
        "contract": plan.stage.contract_hash(),
        "inputs": locators(inputs),
        "params": plan.params,
        "outputs": locators(outputs),
    }))
}

impl<S: ArtifactStore, E: EventStore> RunSubmitter for LocalRuntime<S, E> {
    fn submit(&mut self, doc: &CompiledDocument, params: &ParamOverrides) -> Result<Uuid, RuntimeError> {
        self.gate(doc)?;
        let document_digest = Compiler::default().to_json(doc)
                                                 .map(|text| digest(text.as_bytes()))
                                                 .map_err(|e| RuntimeError::Document(e.to_string()))?;

        // El plan toma prestado `self`; se materializa en datos propios
        // antes de mutar el store y los eventos.
        let (tasks, resolved) = {
            let (plans, resolved) = self.plan(doc, params)?;
            let tasks: Vec<(TaskSpec, String, ResolvedParams)> =
                plans.into_iter()
                     .map(|p| (p.task.clone(), p.task.component_ref.clone(), p.params))
                     .collect();
            (tasks, resolved)
        };

        let run_id = Uuid::new_v4();
        self.events
            .append_kind(run_id,
                         RunEventKind::RunInitialized { pipeline: doc.pipeline_info.name.clone(),
                                                        document_digest: document_digest.clone(),
                                                        task_count: tasks.len(),
                                                        parameters: resolved.as_map().clone() });
        info!("run {run_id} submitted for `{}` ({document_digest})", doc.pipeline_info.name);

        let mut produced: BTreeMap<(String, String), ArtifactRef> = BTreeMap::new();
        let mut fingerprints = Vec::with_capacity(tasks.len());
        for (index, (task, component, own_params)) in tasks.iter().enumerate() {
            let Some(stage) = self.registry.get(component) else {
                return Err(RuntimeError::UnknownComponent { task: task.name.clone(),
                                                            component: component.clone() });
            };
            let plan = Plan { task,
                              stage,
                              params: own_params.clone() };

            let mut inputs = BTreeMap::new();
            let mut missing = None;
            for slot in stage.inputs() {
                let bound = task.inputs
                                .artifacts
                                .get(slot.name)
                                .and_then(|b| produced.get(&(b.producer_task.clone(), b.output_key.clone())))
                                .filter(|r| self.store.contains(r.locator()));
                match bound {
                    Some(r) => {
                        inputs.insert(slot.name.to_string(), r.clone());
                    }
                    None => {
                        missing = Some(slot.name);
                        break;
                    }
                }
            }
            if let Some(slot) = missing {
                let fp = task_fingerprint(index, &plan, &inputs, &BTreeMap::new());
                let error = StageError::MissingInput(slot.to_string());
                self.fail(run_id, index, &task.name, &error, fp);
                return Ok(run_id);
            }

            self.events
                .append_kind(run_id,
                             RunEventKind::StageStarted { task_index: index,
                                                          task: task.name.clone() });
            debug!("run {run_id}: task `{}` started", task.name);

            let run = {
                let ctx = StageContext::new(&task.name, inputs.clone(), own_params.clone(), &self.store);
                stage.run(&ctx)
            };
            let result = run.and_then(|run| {
                                            let mut outputs = BTreeMap::new();
                                            for out in &run.outputs {
                                                let artifact = self.store.put(out.kind,
                                                                              &task.name,
                                                                              out.provenance,
                                                                              out.payload.clone())?;
                                                outputs.insert(out.slot.to_string(), artifact);
                                            }
                                            Ok((run.signals, outputs))
                                        });
            let (signals, outputs) = match result {
                Ok(done) => done,
                Err(error) => {
                    let fp = task_fingerprint(index, &plan, &inputs, &BTreeMap::new());
                    self.fail(run_id, index, &task.name, &error, fp);
                    return Ok(run_id);
                }
            };

            for s in signals {
                info!("run {run_id}: task `{}` signal `{}`", task.name, s.signal);
                self.events
                    .append_kind(run_id,
                                 RunEventKind::StageSignal { task_index: index,
                                                             task: task.name.clone(),
                                                             signal: s.signal,
                                                             data: s.data });
            }
            let fingerprint = task_fingerprint(index, &plan, &inputs, &outputs);
            for (slot, artifact) in &outputs {
                produced.insert((task.name.clone(), slot.clone()), artifact.clone());
            }
            self.events
                .append_kind(run_id,
                             RunEventKind::StageFinished { task_index: index,
                                                           task: task.name.clone(),
                                                           outputs,
                                                           fingerprint: fingerprint.clone() });
            fingerprints.push(fingerprint);
        }

        let run_fingerprint = hash_value(&json!({
            "engine_version": ENGINE_VERSION,
            "document_digest": document_digest,
            "tasks": fingerprints,
        }));
        self.events
            .append_kind(run_id, RunEventKind::RunCompleted { run_fingerprint });
        info!("run {run_id} succeeded");
        Ok(run_id)
    }

    fn status(&self, run_id: Uuid) -> Result<RunStatus, RuntimeError> {
        self.state(run_id).map(|s| s.status)
    }
}
