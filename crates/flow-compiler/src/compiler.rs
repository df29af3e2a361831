use std::collections::BTreeMap;
use std::path::Path;

use flow_core::constants::{DOCUMENT_SCHEMA_VERSION, SDK_VERSION};
use flow_core::{ParamSpec, ParamType, ParamValue, PipelineGraph, StageDefinition};
use log::{debug, info};
use sha2::{Digest, Sha256};

use crate::document::{ArtifactBinding, CompiledDocument, ComponentSpec, ContainerSpec, DagSpec, DeploymentSpec,
                      ExecutorSpec, IoSpec, ParameterSpec, PipelineInfo, PipelineInput, RootSpec, TaskInputs, TaskSpec};
use crate::error::CompilationError;

/// Ubicación fija del documento compilado.
pub const DEFAULT_OUTPUT: &str = "components/pipeline.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Imagen de contenedor registrada en cada executor.
    pub image: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self { image: format!("irisflow/stages:{}", env!("CARGO_PKG_VERSION")) }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompilerOptions,
}

pub fn component_name(stage_id: &str) -> String {
    format!("comp-{stage_id}")
}

pub fn executor_name(stage_id: &str) -> String {
    format!("exec-{stage_id}")
}

/// Prefijo de todo marcador que el orquestador sustituye antes de lanzar el
/// contenedor. Un argumento que aún lo contiene no está resuelto.
pub const BINDING_MARKER: &str = "{{$.inputs.";

/// Marcador del valor del parámetro `name` en los args de un executor.
pub fn param_binding(name: &str) -> String {
    format!("{BINDING_MARKER}parameters['{name}']}}}}")
}

/// Marcador del locator del artefacto que llega a la ranura `slot`.
pub fn artifact_binding(slot: &str) -> String {
    format!("{BINDING_MARKER}artifacts['{slot}']}}}}")
}

fn type_name(ty: ParamType) -> &'static str {
    match ty {
        ParamType::String => "STRING",
        ParamType::Float => "NUMBER_DOUBLE",
        ParamType::Int => "NUMBER_INTEGER",
        ParamType::IntOrUnbounded => "NUMBER_INTEGER_OR_UNBOUNDED",
    }
}

fn json_value(v: &ParamValue) -> serde_json::Value {
    match v {
        ParamValue::Int(i) => serde_json::Value::from(*i),
        ParamValue::Float(x) => serde_json::Value::from(*x),
        ParamValue::Text(s) => serde_json::Value::from(s.as_str()),
    }
}

fn parameter_spec(spec: &ParamSpec) -> ParameterSpec {
    ParameterSpec { parameter_type: type_name(spec.ty).to_string(),
                    default_value: json_value(&spec.default),
                    constraint: spec.constraint.to_string(),
                    description: spec.description.clone() }
}

impl Compiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Serializa `graph`. No escribe nada ni modifica el grafo.
    pub fn compile(&self, graph: &PipelineGraph) -> Result<CompiledDocument, CompilationError> {
        if !graph.is_validated() {
            return Err(CompilationError::Unvalidated(graph.name().to_string()));
        }
        if graph.name().trim().is_empty() {
            return Err(CompilationError::Invalid("pipeline name is empty".into()));
        }
        if graph.is_empty() {
            return Err(CompilationError::Invalid("pipeline has no stages".into()));
        }

        let mut components = BTreeMap::new();
        let mut executors = BTreeMap::new();
        let mut tasks = Vec::with_capacity(graph.len());
        for stage in graph.stages() {
            let id = stage.id();
            components.insert(component_name(id), self.component(stage));
            executors.insert(executor_name(id), self.executor(graph, stage));
            tasks.push(self.task(graph, stage)?);
        }

        let mut input_definitions = BTreeMap::new();
        for (name, p) in graph.parameters() {
            input_definitions.insert(name.clone(),
                                     PipelineInput { parameter_type: type_name(p.spec.ty).to_string(),
                                                     default_value: json_value(&p.spec.default),
                                                     value: json_value(&p.value),
                                                     constraint: p.spec.constraint.to_string(),
                                                     description: p.spec.description.clone() });
        }

        debug!("compiled `{}`: {} components, {} parameters",
               graph.name(),
               components.len(),
               input_definitions.len());
        Ok(CompiledDocument { pipeline_info: PipelineInfo { name: graph.name().to_string(),
                                                            description: graph.description().to_string() },
                              sdk_version: SDK_VERSION.to_string(),
                              schema_version: DOCUMENT_SCHEMA_VERSION.to_string(),
                              components,
                              deployment_spec: DeploymentSpec { executors },
                              root: RootSpec { dag: DagSpec { tasks },
                                               input_definitions } })
    }

    fn component(&self, stage: &dyn StageDefinition) -> ComponentSpec {
        let io = |slots: Vec<flow_core::ArtifactSlot>| {
            slots.into_iter()
                 .map(|s| IoSpec { name: s.name.to_string(),
                                   artifact_type: s.kind.to_string() })
                 .collect()
        };
        ComponentSpec { executor_label: executor_name(stage.id()),
                        inputs: io(stage.inputs()),
                        outputs: io(stage.outputs()),
                        parameters: stage.parameters()
                                         .iter()
                                         .map(|p| (p.name.clone(), parameter_spec(p)))
                                         .collect(),
                        contract: stage.contract_hash() }
    }

    fn executor(&self, graph: &PipelineGraph, stage: &dyn StageDefinition) -> ExecutorSpec {
        // Mismo formato que acepta `irisflow stage`: SLOT=LOCATOR y NAME=VALUE.
        let mut args = Vec::new();
        for e in graph.inputs_of(stage.id()) {
            args.push("--input".to_string());
            args.push(format!("{}={}", e.input, artifact_binding(&e.input)));
        }
        for p in stage.parameters() {
            args.push("--param".to_string());
            args.push(format!("{}={}", p.name, param_binding(&p.name)));
        }
        ExecutorSpec { container: ContainerSpec { image: self.options.image.clone(),
                                                  command: stage.command(),
                                                  args } }
    }

    fn task(&self, graph: &PipelineGraph, stage: &dyn StageDefinition) -> Result<TaskSpec, CompilationError> {
        let id = stage.id();
        let mut artifacts = BTreeMap::new();
        for e in graph.inputs_of(id) {
            if graph.stage(&e.from_stage).is_none() {
                return Err(CompilationError::Invalid(format!("edge into `{id}` references unknown stage `{}`",
                                                             e.from_stage)));
            }
            artifacts.insert(e.input.clone(),
                             ArtifactBinding { producer_task: e.from_stage.clone(),
                                               output_key: e.output.clone() });
        }
        let mut parameters = BTreeMap::new();
        for p in stage.parameters() {
            if !graph.parameters().contains_key(&p.name) {
                return Err(CompilationError::Invalid(format!("parameter `{}` of `{id}` was not resolved", p.name)));
            }
            parameters.insert(p.name.clone(), p.name);
        }
        Ok(TaskSpec { name: id.to_string(),
                      display_name: stage.display_name().to_string(),
                      component_ref: component_name(id),
                      dependent_tasks: graph.upstream_of(id).into_iter().map(str::to_string).collect(),
                      inputs: TaskInputs { artifacts, parameters } })
    }

    /// JSON con claves ordenadas, dos espacios de sangría y salto final.
    pub fn to_json(&self, doc: &CompiledDocument) -> Result<String, CompilationError> {
        // Pasar por `Value` ordena también los campos de los structs.
        let value = serde_json::to_value(doc)?;
        let mut text = serde_json::to_string_pretty(&value)?;
        text.push('\n');
        Ok(text)
    }

    /// Escribe el documento en `path` (creando directorios) y devuelve su
    /// digest.
    pub fn write(&self, doc: &CompiledDocument, path: &Path) -> Result<String, CompilationError> {
        let text = self.to_json(doc)?;
        let io_err = |source| CompilationError::Io { path: path.to_path_buf(),
                                                     source };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, text.as_bytes()).map_err(io_err)?;
        let digest = digest(text.as_bytes());
        info!("pipeline `{}` compiled to {} ({digest})", doc.pipeline_info.name, path.display());
        Ok(digest)
    }
}

/// `sha256:<hex>` de los bytes serializados.
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_prefixed_sha256() {
        let d = digest(b"abc");
        assert_eq!(d, "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }

    #[test]
    fn parameter_types_are_stable_names() {
        assert_eq!(type_name(ParamType::Float), "NUMBER_DOUBLE");
        assert_eq!(json_value(&ParamValue::Text("drop".into())), serde_json::json!("drop"));
    }

    #[test]
    fn bindings_are_orchestrator_placeholders() {
        assert_eq!(param_binding("seed"), "{{$.inputs.parameters['seed']}}");
        assert_eq!(artifact_binding("dataset"), "{{$.inputs.artifacts['dataset']}}");
        assert!(param_binding("seed").starts_with(BINDING_MARKER));
    }
}
