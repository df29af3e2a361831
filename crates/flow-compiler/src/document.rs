//! Forma serializada del pipeline.
//!
//! Los mapas son `BTreeMap` y `Compiler::to_json` serializa vía `Value`, así
//! que todas las claves salen ordenadas, campos de struct incluidos. Las
//! listas conservan el orden declarado (tareas en orden topológico).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledDocument {
    pub pipeline_info: PipelineInfo,
    pub sdk_version: String,
    pub schema_version: String,
    /// Nombre de componente -> spec del stage.
    pub components: BTreeMap<String, ComponentSpec>,
    pub deployment_spec: DeploymentSpec,
    pub root: RootSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineInfo {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    pub executor_label: String,
    pub inputs: Vec<IoSpec>,
    pub outputs: Vec<IoSpec>,
    pub parameters: BTreeMap<String, ParameterSpec>,
    /// Hash del contrato del stage.
    pub contract: String,
}

/// Input u output declarado de un componente.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IoSpec {
    pub name: String,
    pub artifact_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    pub parameter_type: String,
    pub default_value: Value,
    pub constraint: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    pub executors: BTreeMap<String, ExecutorSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorSpec {
    pub container: ContainerSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub image: String,
    pub command: Vec<String>,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootSpec {
    pub dag: DagSpec,
    pub input_definitions: BTreeMap<String, PipelineInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagSpec {
    pub tasks: Vec<TaskSpec>,
}

/// Instancia de un componente dentro del DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    pub name: String,
    pub display_name: String,
    pub component_ref: String,
    pub dependent_tasks: Vec<String>,
    pub inputs: TaskInputs,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskInputs {
    /// Input del componente -> output de una tarea upstream.
    pub artifacts: BTreeMap<String, ArtifactBinding>,
    /// Parámetro del componente -> parámetro del pipeline.
    pub parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactBinding {
    pub producer_task: String,
    pub output_key: String,
}

/// Parámetro a nivel de pipeline con el valor resuelto al compilar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineInput {
    pub parameter_type: String,
    pub default_value: Value,
    pub value: Value,
    pub constraint: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl CompiledDocument {
    /// Tarea por nombre.
    pub fn task(&self, name: &str) -> Option<&TaskSpec> {
        self.root.dag.tasks.iter().find(|t| t.name == name)
    }

    /// Lee un documento serializado.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
