use std::fmt::Debug;

use serde::Serialize;
use serde_json::json;

use super::{StageContext, StageRun};
use crate::errors::StageError;
use crate::model::ArtifactKind;
use crate::param::ParamSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StageKind {
    Source,
    Transform,
    Sink,
}

/// Input u output declarado: nombre del canal y kind del artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArtifactSlot {
    pub name: &'static str,
    pub kind: ArtifactKind,
}

impl ArtifactSlot {
    pub const fn new(name: &'static str, kind: ArtifactKind) -> Self {
        Self { name, kind }
    }
}

/// Contrato de un stage. Implementaciones deben ser puras respecto a inputs
/// + params y tolerar re-ejecuciones con los mismos inputs.
pub trait StageDefinition: Debug + Send + Sync {
    /// Identificador estable y único dentro del pipeline.
    fn id(&self) -> &'static str;

    /// Nombre amigable para humanos.
    fn display_name(&self) -> &str {
        self.id()
    }

    fn kind(&self) -> StageKind;

    /// Inputs declarados, en orden.
    fn inputs(&self) -> Vec<ArtifactSlot>;

    /// Outputs declarados, en orden.
    fn outputs(&self) -> Vec<ArtifactSlot>;

    /// Parámetros declarados con sus defaults y restricciones.
    fn parameters(&self) -> Vec<ParamSpec>;

    /// Comando con el que un runtime externo ejecuta este stage.
    fn command(&self) -> Vec<String> {
        vec!["irisflow".to_string(), "stage".to_string(), self.id().to_string()]
    }

    /// Ejecución pura del stage.
    fn run(&self, ctx: &StageContext<'_>) -> Result<StageRun, StageError>;

    /// Hash del contrato (id, kind, slots y parámetros).
    fn contract_hash(&self) -> String {
        let contract = json!({
            "id": self.id(),
            "kind": self.kind(),
            "inputs": self.inputs(),
            "outputs": self.outputs(),
            "parameters": self.parameters(),
        });
        crate::hashing::hash_value(&contract)
    }
}
