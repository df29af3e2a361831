use std::collections::{BTreeSet, HashMap, HashSet};

use indexmap::IndexMap;
use log::debug;

use crate::errors::{BuildError, GraphError, ParameterError};
use crate::model::ArtifactKind;
use crate::param::{ParamOverrides, ParamSpec, ParamValue, ResolvedParams};
use crate::stage::{ArtifactSlot, StageDefinition};

/// Dependencia `from_stage.output -> to_stage.input`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from_stage: String,
    pub output: String,
    pub to_stage: String,
    pub input: String,
    pub kind: ArtifactKind,
}

/// Parámetro de pipeline resuelto, compartido por los stages que lo declaran.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineParameter {
    pub spec: ParamSpec,
    pub value: ParamValue,
    pub used_by: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    Draft,
    Validated,
}

/// Grafo inmutable de stages.
#[derive(Debug)]
pub struct PipelineGraph {
    name: String,
    description: String,
    stages: Vec<Box<dyn StageDefinition>>,
    overrides: ParamOverrides,
    edges: Vec<Edge>,
    order: Vec<usize>,
    parameters: IndexMap<String, PipelineParameter>,
    state: GraphState,
}

impl PipelineGraph {
    pub(crate) fn draft(name: String,
                        description: String,
                        stages: Vec<Box<dyn StageDefinition>>,
                        overrides: ParamOverrides)
                        -> Self {
        let order = (0..stages.len()).collect();
        Self { name,
               description,
               stages,
               overrides,
               edges: Vec::new(),
               order,
               parameters: IndexMap::new(),
               state: GraphState::Draft }
    }

    /// Valida el grafo. Consume el borrador: un grafo inválido no sobrevive.
    pub fn validate(mut self) -> Result<Self, BuildError> {
        if self.stages.is_empty() {
            return Err(GraphError::Empty.into());
        }
        let mut seen = HashSet::new();
        for s in &self.stages {
            if !seen.insert(s.id()) {
                return Err(GraphError::DuplicateStage(s.id().to_string()).into());
            }
        }
        let edges = wire_edges(&self.stages)?;
        let order = topological_order(&self.stages, &edges)?;
        let parameters = resolve_parameters(&self.stages, &order, &self.overrides)?;
        debug!("pipeline `{}`: {} stages, {} edges, {} parameters",
               self.name,
               self.stages.len(),
               edges.len(),
               parameters.len());
        self.edges = edges;
        self.order = order;
        self.parameters = parameters;
        self.state = GraphState::Validated;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn state(&self) -> GraphState {
        self.state
    }

    pub fn is_validated(&self) -> bool {
        self.state == GraphState::Validated
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stages en orden topológico (orden de declaración si es borrador).
    pub fn stages(&self) -> impl Iterator<Item = &dyn StageDefinition> + '_ {
        self.order.iter().map(move |&i| self.stages[i].as_ref())
    }

    pub fn stage(&self, id: &str) -> Option<&dyn StageDefinition> {
        self.stages.iter().find(|s| s.id() == id).map(|s| s.as_ref())
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Aristas que alimentan los inputs de `stage_id`.
    pub fn inputs_of<'a>(&'a self, stage_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.to_stage == stage_id)
    }

    /// Stages de los que depende `stage_id` (ordenados, sin duplicados).
    pub fn upstream_of(&self, stage_id: &str) -> Vec<&str> {
        let set: BTreeSet<&str> = self.edges
                                       .iter()
                                       .filter(|e| e.to_stage == stage_id)
                                       .map(|e| e.from_stage.as_str())
                                       .collect();
        set.into_iter().collect()
    }

    pub fn parameters(&self) -> &IndexMap<String, PipelineParameter> {
        &self.parameters
    }

    /// Parámetros resueltos que corresponden a `stage_id`.
    pub fn stage_params(&self, stage_id: &str) -> Result<ResolvedParams, ParameterError> {
        let stage = self.stage(stage_id)
                        .ok_or_else(|| ParameterError::Missing { name: stage_id.to_string() })?;
        let specs = stage.parameters();
        let mut values = ParamOverrides::new();
        for spec in &specs {
            let p = self.parameters
                        .get(&spec.name)
                        .ok_or_else(|| ParameterError::Missing { name: spec.name.clone() })?;
            values.insert(spec.name.clone(), p.value.clone());
        }
        ResolvedParams::resolve(&specs, &values)
    }
}

fn wire_edges(stages: &[Box<dyn StageDefinition>]) -> Result<Vec<Edge>, GraphError> {
    let mut edges = Vec::new();
    for consumer in stages {
        for input in consumer.inputs() {
            let others = || stages.iter().filter(|p| p.id() != consumer.id());
            let mut candidates: Vec<(&str, ArtifactSlot)> =
                others().flat_map(|p| {
                            let id = p.id();
                            p.outputs().into_iter().filter(|o| o.name == input.name).map(move |o| (id, o))
                        })
                        .collect();
            if candidates.is_empty() {
                candidates = others().flat_map(|p| {
                                         let id = p.id();
                                         p.outputs().into_iter().filter(|o| o.kind == input.kind).map(move |o| (id, o))
                                     })
                                     .collect();
            }
            match candidates.as_slice() {
                [] => {
                    return Err(GraphError::UnsatisfiedInput { stage: consumer.id().to_string(),
                                                              input: input.name.to_string() })
                }
                [(producer, slot)] => {
                    if slot.kind != input.kind {
                        return Err(GraphError::KindMismatch { stage: consumer.id().to_string(),
                                                              input: input.name.to_string(),
                                                              producer: producer.to_string(),
                                                              expected: input.kind,
                                                              found: slot.kind });
                    }
                    edges.push(Edge { from_stage: producer.to_string(),
                                      output: slot.name.to_string(),
                                      to_stage: consumer.id().to_string(),
                                      input: input.name.to_string(),
                                      kind: input.kind });
                }
                many => {
                    return Err(GraphError::AmbiguousInput { stage: consumer.id().to_string(),
                                                            input: input.name.to_string(),
                                                            producers: many.iter()
                                                                           .map(|(p, s)| format!("{p}.{}", s.name))
                                                                           .collect() })
                }
            }
        }
    }
    Ok(edges)
}

/// Kahn estable: entre stages listos gana el declarado primero.
fn topological_order(stages: &[Box<dyn StageDefinition>], edges: &[Edge]) -> Result<Vec<usize>, GraphError> {
    let index: HashMap<&str, usize> = stages.iter().enumerate().map(|(i, s)| (s.id(), i)).collect();
    let n = stages.len();
    let mut indegree = vec![0usize; n];
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    for e in edges {
        let (Some(&from), Some(&to)) = (index.get(e.from_stage.as_str()), index.get(e.to_stage.as_str())) else {
            continue;
        };
        if !adjacency[from].contains(&to) {
            adjacency[from].push(to);
            indegree[to] += 1;
        }
    }
    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(i) = ready.pop_first() {
        order.push(i);
        for &t in &adjacency[i] {
            indegree[t] -= 1;
            if indegree[t] == 0 {
                ready.insert(t);
            }
        }
    }
    if order.len() < n {
        let stuck = (0..n).filter(|i| !order.contains(i))
                          .map(|i| stages[i].id().to_string())
                          .collect();
        return Err(GraphError::Cycle(stuck));
    }
    Ok(order)
}

fn resolve_parameters(stages: &[Box<dyn StageDefinition>],
                      order: &[usize],
                      overrides: &ParamOverrides)
                      -> Result<IndexMap<String, PipelineParameter>, BuildError> {
    let mut declared: IndexMap<String, (ParamSpec, Vec<String>)> = IndexMap::new();
    for &i in order {
        let stage = &stages[i];
        for spec in stage.parameters() {
            match declared.get_mut(&spec.name) {
                Some((existing, users)) => {
                    if !existing.same_contract(&spec) {
                        let mut all = users.clone();
                        all.push(stage.id().to_string());
                        return Err(GraphError::ConflictingParameter { name: spec.name.clone(),
                                                                      stages: all }.into());
                    }
                    users.push(stage.id().to_string());
                }
                None => {
                    declared.insert(spec.name.clone(), (spec, vec![stage.id().to_string()]));
                }
            }
        }
    }
    if let Some(unknown) = overrides.keys().find(|k| !declared.contains_key(k.as_str())) {
        return Err(ParameterError::Unknown { name: unknown.clone() }.into());
    }
    let mut out = IndexMap::with_capacity(declared.len());
    for (name, (spec, used_by)) in declared {
        let value = spec.resolve(overrides.get(&name))?;
        out.insert(name, PipelineParameter { spec, value, used_by });
    }
    Ok(out)
}
