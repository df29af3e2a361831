use std::path::Path;

use serde_json::{Map, Value};

use crate::placeholder::is_placeholder;
use crate::report::{Summary, ValidationReport};
use crate::StructuralValidationError;

/// Secciones obligatorias de primer nivel.
pub const REQUIRED_SECTIONS: [&str; 3] = ["pipelineInfo", "components", "deploymentSpec"];

pub fn validate_path(path: &Path) -> ValidationReport {
    match std::fs::read_to_string(path) {
        Ok(text) => validate_str(&text),
        Err(e) => {
            let mut report = ValidationReport::default();
            report.errors.push(StructuralValidationError::Unreadable { path: path.display().to_string(),
                                                                       reason: e.to_string() });
            report
        }
    }
}

pub fn validate_str(text: &str) -> ValidationReport {
    match serde_json::from_str::<Value>(text) {
        Ok(v) => validate_value(&v),
        Err(e) => {
            let mut report = ValidationReport::default();
            report.errors.push(StructuralValidationError::InvalidStructure(e.to_string()));
            report
        }
    }
}

pub fn validate_value(doc: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();
    let Some(root) = doc.as_object() else {
        report.errors
              .push(StructuralValidationError::InvalidStructure("top level is not a mapping".into()));
        return report;
    };

    for field in REQUIRED_SECTIONS {
        if !root.contains_key(field) {
            report.errors.push(StructuralValidationError::MissingField(field.to_string()));
        }
    }
    check_pipeline_info(root, &mut report);
    check_components(root, &mut report);
    check_deployment(root, &mut report);
    check_input_definitions(root, &mut report);

    report.summary.execution_step_count = match root.get("root").and_then(|r| r.pointer("/dag/tasks")) {
        Some(Value::Array(tasks)) => tasks.len(),
        Some(Value::Object(tasks)) => tasks.len(),
        _ => executors(root).map_or(0, Map::len),
    };
    if root.get("sdkVersion").and_then(Value::as_str).is_none() {
        report.warnings.push("`sdkVersion` is missing".into());
    }
    report
}

fn executors(root: &Map<String, Value>) -> Option<&Map<String, Value>> {
    root.get("deploymentSpec")?.get("executors")?.as_object()
}

fn check_pipeline_info(root: &Map<String, Value>, report: &mut ValidationReport) {
    let Some(info) = root.get("pipelineInfo") else {
        return;
    };
    let Some(info) = info.as_object() else {
        report.errors
              .push(StructuralValidationError::InvalidStructure("`pipelineInfo` is not a mapping".into()));
        return;
    };
    let text = |k: &str| info.get(k).and_then(Value::as_str).map(str::to_string);
    report.summary = Summary { name: text("name"),
                               description: text("description"),
                               sdk_version: root.get("sdkVersion").and_then(Value::as_str).map(str::to_string),
                               ..report.summary.clone() };
    if report.summary.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
        report.errors.push(StructuralValidationError::MissingField("pipelineInfo.name".into()));
    }
    if report.summary.description.is_none() {
        report.warnings.push("`pipelineInfo.description` is missing".into());
    }
}

fn check_components(root: &Map<String, Value>, report: &mut ValidationReport) {
    let Some(components) = root.get("components") else {
        return;
    };
    let Some(components) = components.as_object() else {
        report.errors
              .push(StructuralValidationError::InvalidStructure("`components` is not a mapping".into()));
        return;
    };
    report.summary.component_count = components.len();
    if components.is_empty() {
        report.errors.push(StructuralValidationError::EmptyComponents);
    }
    let executors = executors(root);
    for (name, spec) in components {
        if is_placeholder(name) {
            report.errors.push(StructuralValidationError::Placeholder { token: name.clone(),
                                                                        location: "components".into() });
        }
        if let Some(params) = spec.get("parameters").and_then(Value::as_object) {
            for (param, decl) in params {
                scan(decl.get("defaultValue"),
                     &format!("components.{name}.parameters.{param}.defaultValue"),
                     report);
            }
        }
        match spec.get("executorLabel").and_then(Value::as_str) {
            Some(label) if executors.is_some_and(|e| !e.contains_key(label)) => {
                report.warnings.push(format!("component `{name}` references unknown executor `{label}`"))
            }
            None => report.warnings.push(format!("component `{name}` has no executorLabel")),
            _ => {}
        }
    }
}

fn check_deployment(root: &Map<String, Value>, report: &mut ValidationReport) {
    let Some(deployment) = root.get("deploymentSpec") else {
        return;
    };
    if !deployment.is_object() {
        report.errors
              .push(StructuralValidationError::InvalidStructure("`deploymentSpec` is not a mapping".into()));
        return;
    }
    match executors(root) {
        Some(e) if e.is_empty() => report.warnings.push("`deploymentSpec.executors` is empty".into()),
        Some(_) => {}
        None => report.warnings.push("`deploymentSpec.executors` is missing".into()),
    }
}

fn check_input_definitions(root: &Map<String, Value>, report: &mut ValidationReport) {
    let Some(defs) = root.get("root").and_then(|r| r.get("inputDefinitions")).and_then(Value::as_object) else {
        return;
    };
    for (param, decl) in defs {
        for key in ["defaultValue", "value"] {
            scan(decl.get(key), &format!("root.inputDefinitions.{param}.{key}"), report);
        }
    }
}

/// Busca placeholders en un valor de parámetro (strings y listas).
fn scan(value: Option<&Value>, location: &str, report: &mut ValidationReport) {
    match value {
        Some(Value::String(s)) if is_placeholder(s) => {
            report.errors.push(StructuralValidationError::Placeholder { token: s.clone(),
                                                                        location: location.to_string() })
        }
        Some(Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                scan(Some(item), &format!("{location}[{i}]"), report);
            }
        }
        _ => {}
    }
}
