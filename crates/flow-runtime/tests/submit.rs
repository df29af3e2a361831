use std::collections::BTreeMap;
use std::sync::Arc;

use flow_compiler::{CompiledDocument, Compiler};
use flow_core::{InMemoryArtifactStore, ParamOverrides, ParamValue, ParameterError, Provenance};
use flow_runtime::{LocalRuntime, RunEventKind, RunStatus, RunSubmitter, RuntimeError, StageRegistry, TaskStatus};
use flow_stages::stages::{params, slots, EVALUATION_ID, EXTRACTION_ID, PREPROCESSING_ID};
use flow_stages::{iris_pipeline, iris_stages, DataExtraction, DatasetTable, FallbackDataset, MetricsReport,
                  MirrorRemote};
use flow_validator::StructuralValidationError;

fn document() -> CompiledDocument {
    let graph = iris_pipeline(&ParamOverrides::new()).unwrap();
    Compiler::default().compile(&graph).unwrap()
}

fn runtime(extraction: DataExtraction) -> LocalRuntime<InMemoryArtifactStore> {
    LocalRuntime::new(StageRegistry::with_stages(iris_stages(extraction)), InMemoryArtifactStore::new())
}

fn overrides(pairs: &[(&str, ParamValue)]) -> ParamOverrides {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[test]
fn default_submission_succeeds_through_the_fallback() {
    let mut rt = runtime(DataExtraction::default());
    let run = rt.submit(&document(), &ParamOverrides::new()).unwrap();
    assert_eq!(rt.status(run).unwrap(), RunStatus::Succeeded);

    let state = rt.state(run).unwrap();
    assert_eq!(state.task_count, 4);
    assert!(state.run_fingerprint.is_some());
    assert!(state.tasks.iter().all(|t| t.status == TaskStatus::Succeeded && t.fingerprint.is_some()));
    assert_eq!(state.parameters[params::SEED], ParamValue::Int(42));

    let extraction = state.task(EXTRACTION_ID).unwrap();
    assert_eq!(extraction.signals.len(), 1);
    assert_eq!(extraction.signals[0].0, "fallback");
    assert_eq!(state.output(EXTRACTION_ID, slots::DATASET).unwrap().provenance(), Provenance::Fallback);

    let test: DatasetTable = rt.load(state.output(PREPROCESSING_ID, slots::TEST_DATA).unwrap()).unwrap();
    assert_eq!(test.n_rows(), 30);
    let metrics: MetricsReport = rt.load(state.output(EVALUATION_ID, slots::METRICS).unwrap()).unwrap();
    assert!((0.90..=1.0).contains(&metrics.accuracy), "accuracy {}", metrics.accuracy);
}

#[test]
fn events_follow_the_run_state_machine() {
    let mut rt = runtime(DataExtraction::default());
    let run = rt.submit(&document(), &ParamOverrides::new()).unwrap();
    let events = flow_runtime::EventStore::list(rt.events(), run);
    assert!(matches!(events.first().map(|e| &e.kind), Some(RunEventKind::RunInitialized { .. })));
    assert!(matches!(events.last().map(|e| &e.kind), Some(RunEventKind::RunCompleted { .. })));
    let started: Vec<&str> = events.iter()
                                   .filter_map(|e| match &e.kind {
                                       RunEventKind::StageStarted { task, .. } => Some(task.as_str()),
                                       _ => None,
                                   })
                                   .collect();
    assert_eq!(started.len(), 4);
    assert_eq!(started[0], EXTRACTION_ID);
    assert_eq!(started[3], EVALUATION_ID);
    assert!(events.windows(2).all(|w| w[0].seq + 1 == w[1].seq));
}

#[test]
fn identical_submissions_share_fingerprints() {
    let mut rt = runtime(DataExtraction::default());
    let doc = document();
    let p = overrides(&[(params::TREE_COUNT, ParamValue::Int(20))]);
    let a = rt.submit(&doc, &p).unwrap();
    let b = rt.submit(&doc, &p).unwrap();
    assert_ne!(a, b);
    let (a, b) = (rt.state(a).unwrap(), rt.state(b).unwrap());
    assert_eq!(a.run_fingerprint, b.run_fingerprint);
    assert_eq!(a.output(EVALUATION_ID, slots::METRICS), b.output(EVALUATION_ID, slots::METRICS));

    let c = rt.submit(&doc, &overrides(&[(params::TREE_COUNT, ParamValue::Int(21))])).unwrap();
    assert_ne!(rt.state(c).unwrap().run_fingerprint, a.run_fingerprint);
}

#[test]
fn out_of_domain_parameter_is_rejected_before_any_run() {
    let mut rt = runtime(DataExtraction::default());
    let err = rt.submit(&document(), &overrides(&[(params::TEST_FRACTION, ParamValue::Float(1.5))]))
                .unwrap_err();
    match err {
        RuntimeError::Parameter(ParameterError::ConstraintViolated { name, .. }) => assert_eq!(name, params::TEST_FRACTION),
        other => panic!("unexpected {other:?}"),
    }
    assert!(flow_runtime::EventStore::runs(rt.events()).is_empty());

    let err = rt.submit(&document(), &overrides(&[("learningRate", ParamValue::Float(0.1))]))
                .unwrap_err();
    assert!(matches!(err, RuntimeError::Parameter(ParameterError::Unknown { .. })));
}

#[test]
fn structurally_invalid_document_is_rejected() {
    let mut rt = runtime(DataExtraction::default());
    let mut doc = document();
    doc.components.clear();
    let err = rt.submit(&doc, &ParamOverrides::new()).unwrap_err();
    match err {
        RuntimeError::Rejected(errors) => assert!(errors.contains(&StructuralValidationError::EmptyComponents)),
        other => panic!("unexpected {other:?}"),
    }

    let mut doc = document();
    doc.root
       .input_definitions
       .get_mut(params::REPO_LOCATOR)
       .unwrap()
       .value = "https://github.com/YOUR_USERNAME/repo.git".into();
    assert!(matches!(rt.submit(&doc, &ParamOverrides::new()), Err(RuntimeError::Rejected(_))));
}

#[test]
fn tampered_contract_is_rejected() {
    let mut rt = runtime(DataExtraction::default());
    let mut doc = document();
    for component in doc.components.values_mut() {
        component.contract = "0".repeat(64);
    }
    assert!(matches!(rt.submit(&doc, &ParamOverrides::new()), Err(RuntimeError::ContractMismatch(_))));
}

#[test]
fn single_class_data_fails_the_evaluation_stage() {
    let mirror = tempfile::tempdir().unwrap();
    let data = mirror.path().join("mlops-kubeflow-assignment").join("data");
    std::fs::create_dir_all(&data).unwrap();
    let mut csv = String::from("a,b,target\n");
    for i in 0..20 {
        csv.push_str(&format!("{}.0,{}.5,0\n", i, i % 3));
    }
    std::fs::write(data.join("iris.csv"), csv).unwrap();

    let extraction = DataExtraction::new(Arc::new(MirrorRemote::new(mirror.path())), FallbackDataset::Embedded);
    let mut rt = runtime(extraction);
    let run = rt.submit(&document(), &ParamOverrides::new()).unwrap();
    match rt.status(run).unwrap() {
        RunStatus::Failed { task, code, .. } => {
            assert_eq!(task, EVALUATION_ID);
            assert_eq!(code, "DegenerateDataError");
        }
        other => panic!("unexpected {other:?}"),
    }
    let state = rt.state(run).unwrap();
    assert!(state.run_fingerprint.is_none());
    assert_eq!(state.task(EVALUATION_ID).map(|t| t.status), Some(TaskStatus::Failed));
    assert_eq!(state.output(EXTRACTION_ID, slots::DATASET).unwrap().provenance(), Provenance::Remote);
}

#[test]
fn unknown_run_is_reported() {
    let rt = runtime(DataExtraction::default());
    let id = uuid::Uuid::new_v4();
    assert!(matches!(rt.status(id), Err(RuntimeError::UnknownRun(x)) if x == id));
}

#[test]
fn single_stage_execution_chains_through_locators() {
    let dir = tempfile::tempdir().unwrap();
    let registry = StageRegistry::with_stages(iris_stages(DataExtraction::default()));
    let mut rt = LocalRuntime::new(registry, flow_core::FsArtifactStore::new(dir.path()));
    let none: BTreeMap<String, String> = BTreeMap::new();

    let extracted = rt.run_stage("comp-data-extraction", &none, &ParamOverrides::new()).unwrap();
    let dataset = extracted[slots::DATASET].locator().to_string();
    assert_eq!(extracted[slots::DATASET].provenance(), Provenance::Fallback);

    let err = rt.run_stage(PREPROCESSING_ID, &none, &ParamOverrides::new()).unwrap_err();
    assert!(matches!(err, RuntimeError::MissingInput { ref input, .. } if input == slots::DATASET));

    let inputs: BTreeMap<String, String> = [(slots::DATASET.to_string(), dataset)].into();
    let split = rt.run_stage(PREPROCESSING_ID, &inputs, &ParamOverrides::new()).unwrap();
    assert!(split.contains_key(slots::TRAIN_DATA) && split.contains_key(slots::TEST_DATA));

    let err = rt.run_stage(PREPROCESSING_ID,
                           &inputs,
                           &overrides(&[(params::MISSING_POLICY, ParamValue::Text("zero".into()))]))
                .unwrap_err();
    assert!(matches!(err, RuntimeError::Parameter(_)));

    let err = rt.run_stage("comp-unknown", &none, &ParamOverrides::new()).unwrap_err();
    assert!(matches!(err, RuntimeError::UnknownComponent { .. }));
}
