use std::process::Command;

use serde_json::json;

fn document() -> serde_json::Value {
    json!({
        "pipelineInfo": {"name": "Iris Classification Pipeline", "description": "demo"},
        "sdkVersion": "irisflow-sdk-0.1.0",
        "components": {
            "comp-data-extraction": {"executorLabel": "exec-data-extraction", "parameters": {
                "dataPath": {"defaultValue": "data/iris.csv"}}},
            "comp-model-training": {"executorLabel": "exec-model-training", "parameters": {}}
        },
        "deploymentSpec": {"executors": {
            "exec-data-extraction": {"container": {"image": "irisflow/stages:0.1.0"}},
            "exec-model-training": {"container": {"image": "irisflow/stages:0.1.0"}}
        }},
        "root": {"dag": {"tasks": [{"name": "data-extraction"}, {"name": "model-training"}]}}
    })
}

fn run(doc: &serde_json::Value) -> (i32, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.json");
    std::fs::write(&path, serde_json::to_string_pretty(doc).unwrap()).unwrap();
    let out = Command::new(env!("CARGO_BIN_EXE_validate-pipeline")).arg(&path)
                                                                   .output()
                                                                   .expect("binary runs");
    (out.status.code().unwrap_or(-1), String::from_utf8_lossy(&out.stdout).into_owned())
}

#[test]
fn valid_document_exits_zero_with_summary() {
    let (code, stdout) = run(&document());
    assert_eq!(code, 0, "{stdout}");
    assert!(stdout.contains("Iris Classification Pipeline"));
    assert!(stdout.contains("Components: 2"));
    assert!(stdout.contains("Execution steps: 2"));
}

#[test]
fn missing_deployment_spec_exits_one_and_names_it() {
    let mut doc = document();
    doc.as_object_mut().unwrap().remove("deploymentSpec");
    let (code, stdout) = run(&doc);
    assert_eq!(code, 1);
    assert!(stdout.contains("deploymentSpec"), "{stdout}");
}

#[test]
fn unreadable_file_exits_one() {
    let out = Command::new(env!("CARGO_BIN_EXE_validate-pipeline")).arg("/no/such/pipeline.json")
                                                                   .output()
                                                                   .unwrap();
    assert_eq!(out.status.code(), Some(1));
}
