use std::collections::BTreeMap;

use crate::errors::StageError;
use crate::model::{ArtifactRef, ArtifactSpec, ArtifactStore};
use crate::param::ResolvedParams;

/// Contexto de ejecución entregado a `StageDefinition::run`.
///
/// Sólo expone lo declarado: referencias a los inputs, los parámetros del
/// stage y lectura del store. No hay forma de escribir desde aquí; los
/// outputs se devuelven en `StageRun` y los guarda el runtime.
pub struct StageContext<'a> {
    stage_id: &'a str,
    inputs: BTreeMap<String, ArtifactRef>,
    params: ResolvedParams,
    store: &'a dyn ArtifactStore,
}

impl<'a> StageContext<'a> {
    pub fn new(stage_id: &'a str,
               inputs: BTreeMap<String, ArtifactRef>,
               params: ResolvedParams,
               store: &'a dyn ArtifactStore)
               -> Self {
        Self { stage_id,
               inputs,
               params,
               store }
    }

    pub fn stage_id(&self) -> &str {
        self.stage_id
    }

    pub fn params(&self) -> &ResolvedParams {
        &self.params
    }

    pub fn input(&self, name: &str) -> Result<&ArtifactRef, StageError> {
        self.inputs
            .get(name)
            .ok_or_else(|| StageError::MissingInput(name.to_string()))
    }

    /// Carga y decodifica el input `name` como payload tipado.
    pub fn load<T: ArtifactSpec>(&self, name: &str) -> Result<T, StageError> {
        let artifact = self.input(name)?;
        let payload = self.store.get(artifact)?;
        Ok(T::from_payload(artifact.kind(), payload)?)
    }
}
