//! Stages ejecutables por el runtime, indexados por nombre de componente.
use std::collections::BTreeMap;

use flow_compiler::component_name;
use flow_core::StageDefinition;

#[derive(Debug, Default)]
pub struct StageRegistry {
    stages: BTreeMap<String, Box<dyn StageDefinition>>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stages(stages: Vec<Box<dyn StageDefinition>>) -> Self {
        let mut registry = Self::new();
        for stage in stages {
            registry.register(stage);
        }
        registry
    }

    /// Registra (o reemplaza) el stage bajo `comp-<id>`.
    pub fn register(&mut self, stage: Box<dyn StageDefinition>) {
        self.stages.insert(component_name(stage.id()), stage);
    }

    /// Acepta el nombre de componente o el id del stage.
    pub fn get(&self, name: &str) -> Option<&dyn StageDefinition> {
        self.stages
            .get(name)
            .or_else(|| self.stages.get(&component_name(name)))
            .map(|s| s.as_ref())
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.stages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
