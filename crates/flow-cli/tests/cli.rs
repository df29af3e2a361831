use std::path::Path;
use std::process::{Command, Output};

fn irisflow(scratch: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_irisflow")).args(args)
                                                .current_dir(scratch)
                                                .env("IRISFLOW_ARTIFACT_ROOT", scratch.join("artifacts"))
                                                .env("IRISFLOW_OUTPUT", scratch.join("components/pipeline.json"))
                                                .env_remove("IRISFLOW_REMOTE_ROOT")
                                                .env_remove("IRISFLOW_FALLBACK_DATASET")
                                                .env("RUST_LOG", "warn")
                                                .output()
                                                .expect("irisflow runs")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[test]
fn compile_then_validate_passes() {
    let dir = tempfile::tempdir().unwrap();
    let out = irisflow(dir.path(), &["compile"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(stdout(&out).contains("sha256:"));
    let doc = dir.path().join("components/pipeline.json");
    assert!(doc.is_file());

    let out = irisflow(dir.path(), &["validate", doc.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert!(text.contains("Components: 4"), "{text}");
    assert!(text.contains("Execution steps: 4"), "{text}");
}

#[test]
fn invalid_parameter_exits_with_usage_code() {
    let dir = tempfile::tempdir().unwrap();
    let out = irisflow(dir.path(), &["compile", "--param", "testFraction=1.5"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("testFraction"));
    assert!(!dir.path().join("components/pipeline.json").exists());
}

#[test]
fn run_prints_the_metrics_report() {
    let dir = tempfile::tempdir().unwrap();
    let out = irisflow(dir.path(), &["run", "--param", "treeCount=25"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let text = stdout(&out);
    assert!(text.contains("succeeded"), "{text}");
    assert!(text.contains("accuracy"), "{text}");
}

#[test]
fn stage_prints_output_locators() {
    let dir = tempfile::tempdir().unwrap();
    let out = irisflow(dir.path(), &["stage", "comp-data-extraction"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(stdout(&out).starts_with("dataset="));

    let out = irisflow(dir.path(), &["stage", "comp-model-training"]);
    assert_eq!(out.status.code(), Some(3));
}

#[test]
fn logs_never_reach_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_irisflow"));
    cmd.args(["stage", "comp-data-extraction"])
       .current_dir(dir.path())
       .env("IRISFLOW_ARTIFACT_ROOT", dir.path().join("artifacts"))
       .env_remove("IRISFLOW_REMOTE_ROOT")
       .env_remove("IRISFLOW_FALLBACK_DATASET")
       .env("RUST_LOG", "info");
    let out = cmd.output().expect("irisflow runs");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let text = stdout(&out);
    assert!(!text.is_empty());
    for line in text.lines() {
        let (slot, locator) = line.split_once('=').unwrap_or_else(|| panic!("not a slot=locator line: {line}"));
        assert_eq!(slot, "dataset");
        assert!(!locator.is_empty());
    }
    let logs = String::from_utf8_lossy(&out.stderr);
    assert!(logs.contains("artifact root"), "{logs}");
    assert!(logs.contains("remote fetch"), "{logs}");
}

#[test]
fn unresolved_executor_binding_exits_with_usage_code() {
    let dir = tempfile::tempdir().unwrap();
    let out = irisflow(dir.path(),
                       &["stage", "model-training", "--input", "train_data={{$.inputs.artifacts['train_data']}}"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("not resolved"));
    assert!(stdout(&out).is_empty());
}
