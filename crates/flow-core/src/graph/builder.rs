use super::PipelineGraph;
use crate::errors::BuildError;
use crate::param::{ParamOverrides, ParamValue};
use crate::stage::StageDefinition;

/// Builder del grafo.
///
/// ```ignore
/// let graph = GraphBuilder::new("demo", "descripción")
///     .stage(Extract)
///     .stage(Train)
///     .param("seed", 7)
///     .build()?;
/// ```
#[derive(Debug)]
pub struct GraphBuilder {
    name: String,
    description: String,
    stages: Vec<Box<dyn StageDefinition>>,
    overrides: ParamOverrides,
}

impl GraphBuilder {
    pub fn new(name: &str, description: &str) -> Self {
        Self { name: name.to_string(),
               description: description.to_string(),
               stages: Vec::new(),
               overrides: ParamOverrides::new() }
    }

    #[inline]
    pub fn stage<S>(self, stage: S) -> Self
        where S: StageDefinition + 'static
    {
        self.boxed(Box::new(stage))
    }

    pub fn boxed(mut self, stage: Box<dyn StageDefinition>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Valor provisto para un parámetro de pipeline (se valida en `build`).
    pub fn param(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.overrides.insert(name.to_string(), value.into());
        self
    }

    pub fn params(mut self, overrides: &ParamOverrides) -> Self {
        self.overrides
            .extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Grafo sin validar (sin aristas ni parámetros resueltos).
    pub fn draft(self) -> PipelineGraph {
        PipelineGraph::draft(self.name, self.description, self.stages, self.overrides)
    }

    /// Conecta las dependencias, verifica que el grafo sea acíclico y
    /// resuelve los parámetros.
    pub fn build(self) -> Result<PipelineGraph, BuildError> {
        self.draft().validate()
    }
}
