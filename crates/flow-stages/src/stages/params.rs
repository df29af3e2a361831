//! Declaraciones de parámetros compartidas por los stages. Un parámetro que
//! declaran varios stages (`seed`) sale de la misma función, así el builder
//! ve un único contrato.

use flow_core::{Constraint, ParamSpec, ParamType};
use flow_core::param::UNBOUNDED;

pub const REPO_LOCATOR: &str = "repoLocator";
pub const DATA_PATH: &str = "dataPath";
pub const TEST_FRACTION: &str = "testFraction";
pub const SEED: &str = "seed";
pub const MISSING_POLICY: &str = "missingPolicy";
pub const TREE_COUNT: &str = "treeCount";
pub const MAX_DEPTH: &str = "maxDepth";

pub const DEFAULT_REPO_LOCATOR: &str = "https://github.com/D3aThNdDeMiSe/mlops-kubeflow-assignment.git";
pub const DEFAULT_DATA_PATH: &str = "data/iris.csv";

pub fn repo_locator() -> ParamSpec {
    ParamSpec::string(REPO_LOCATOR, DEFAULT_REPO_LOCATOR).describe("repository that versions the dataset")
}

pub fn data_path() -> ParamSpec {
    ParamSpec::string(DATA_PATH, DEFAULT_DATA_PATH).describe("dataset path inside the repository")
}

pub fn test_fraction() -> ParamSpec {
    ParamSpec::float(TEST_FRACTION, 0.2).with_constraint(Constraint::OpenInterval { min: 0.0, max: 1.0 })
                                        .describe("share of rows held out for evaluation")
}

pub fn seed() -> ParamSpec {
    ParamSpec::int(SEED, 42).describe("seed for the split and the estimator")
}

pub fn missing_policy() -> ParamSpec {
    ParamSpec::string(MISSING_POLICY, "drop").with_constraint(Constraint::OneOf { values: vec!["drop".into(),
                                                                                              "impute-mean".into()] })
                                             .describe("handling of rows with missing feature values")
}

pub fn tree_count() -> ParamSpec {
    ParamSpec::int(TREE_COUNT, 100).with_constraint(Constraint::AtLeast { min: 1 })
                                   .describe("number of trees in the forest")
}

pub fn max_depth() -> ParamSpec {
    ParamSpec::new(MAX_DEPTH, ParamType::IntOrUnbounded, 10, Constraint::AtLeastOrUnbounded { min: 1 })
        .describe(&format!("maximum tree depth, or \"{UNBOUNDED}\""))
}
