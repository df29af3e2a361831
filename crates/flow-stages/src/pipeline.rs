//! Pipeline de clasificación Iris: extracción -> preprocesado ->
//! entrenamiento -> evaluación.

use flow_core::{BuildError, GraphBuilder, ParamOverrides, PipelineGraph, StageDefinition};

use crate::stages::{DataExtraction, DataPreprocessing, ModelEvaluation, ModelTraining};

pub const PIPELINE_NAME: &str = "Iris Classification Pipeline";
pub const PIPELINE_DESCRIPTION: &str = "End-to-end ML pipeline for Iris species classification with versioned data";

/// Los cuatro stages, en orden de declaración.
pub fn iris_stages(extraction: DataExtraction) -> Vec<Box<dyn StageDefinition>> {
    vec![Box::new(extraction),
         Box::new(DataPreprocessing),
         Box::new(ModelTraining),
         Box::new(ModelEvaluation)]
}

/// Builder con los cuatro stages y sin overrides.
pub fn iris_builder(extraction: DataExtraction) -> GraphBuilder {
    iris_stages(extraction).into_iter()
                           .fold(GraphBuilder::new(PIPELINE_NAME, PIPELINE_DESCRIPTION), GraphBuilder::boxed)
}

/// Grafo Iris validado con `overrides` aplicados sobre los defaults.
pub fn iris_pipeline(overrides: &ParamOverrides) -> Result<PipelineGraph, BuildError> {
    iris_builder(DataExtraction::default()).params(overrides).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::{params, EVALUATION_ID, EXTRACTION_ID, PREPROCESSING_ID, TRAINING_ID};
    use flow_core::{ParamValue, ParameterError};

    #[test]
    fn wires_four_stages_in_order() {
        let graph = iris_pipeline(&ParamOverrides::new()).unwrap();
        let order: Vec<&str> = graph.stages().map(|s| s.id()).collect();
        assert_eq!(order, vec![EXTRACTION_ID, PREPROCESSING_ID, TRAINING_ID, EVALUATION_ID]);
        assert_eq!(graph.upstream_of(EVALUATION_ID), vec![PREPROCESSING_ID, TRAINING_ID]);
        assert_eq!(graph.edges().len(), 4);
    }

    #[test]
    fn upstream_stages_of_each_iris_stage() {
        let graph = iris_pipeline(&ParamOverrides::new()).unwrap();
        assert!(graph.upstream_of(EXTRACTION_ID).is_empty());
        assert_eq!(graph.upstream_of(PREPROCESSING_ID), vec![EXTRACTION_ID]);
        assert_eq!(graph.upstream_of(TRAINING_ID), vec![PREPROCESSING_ID]);
        let id = EVALUATION_ID.to_string();
        let upstream = graph.upstream_of(&id);
        drop(id);
        assert_eq!(upstream, vec![PREPROCESSING_ID, TRAINING_ID]);
        assert!(graph.upstream_of("model-serving").is_empty());
    }

    #[test]
    fn exposes_the_documented_parameters() {
        let graph = iris_pipeline(&ParamOverrides::new()).unwrap();
        let p = graph.parameters();
        assert_eq!(p[params::TEST_FRACTION].value, ParamValue::Float(0.2));
        assert_eq!(p[params::TREE_COUNT].value, ParamValue::Int(100));
        assert_eq!(p[params::MAX_DEPTH].value, ParamValue::Int(10));
        assert_eq!(p[params::SEED].value, ParamValue::Int(42));
        assert_eq!(p[params::SEED].used_by, vec![PREPROCESSING_ID.to_string(), TRAINING_ID.to_string()]);
        assert_eq!(p[params::DATA_PATH].value, ParamValue::Text("data/iris.csv".into()));
        assert_eq!(p[params::MISSING_POLICY].value, ParamValue::Text("drop".into()));
    }

    #[test]
    fn test_fraction_out_of_domain_is_a_parameter_error() {
        let overrides: ParamOverrides = [(params::TEST_FRACTION.to_string(), ParamValue::Float(1.5))].into();
        match iris_pipeline(&overrides) {
            Err(BuildError::Parameter(e @ ParameterError::ConstraintViolated { .. })) => {
                assert_eq!(e.name(), params::TEST_FRACTION)
            }
            other => panic!("expected ParameterError, got {other:?}"),
        }
    }
}
