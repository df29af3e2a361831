//! `irisflow`: compilar, validar y ejecutar el pipeline Iris.
//!
//! Códigos de salida: 0 éxito, 1 documento inválido o run fallido,
//! 2 uso incorrecto o parámetro inválido, 3 error de configuración o de I/O.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use flow_compiler::{CompiledDocument, Compiler, BINDING_MARKER};
use flow_core::{FsArtifactStore, ParamOverrides, ParamValue};
use flow_runtime::{LocalRuntime, RunStatus, RunSubmitter, RuntimeError};
use flow_stages::stages::{slots, EVALUATION_ID};
use flow_stages::MetricsReport;
use irisflow::{compile_pipeline, logging, stage_registry, AppConfig, AppError, CONFIG};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "irisflow", version, about = "Iris classification pipeline: compile, validate and run")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compila el pipeline y escribe el documento.
    Compile {
        /// Destino; por defecto `IRISFLOW_OUTPUT`.
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_pair)]
        params: Vec<(String, String)>,
    },
    /// Valida la estructura de un documento compilado.
    Validate { file: PathBuf },
    /// Compila (o lee `--document`), valida y ejecuta localmente.
    Run {
        #[arg(long)]
        document: Option<PathBuf>,
        #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_pair)]
        params: Vec<(String, String)>,
    },
    /// Ejecuta un solo componente contra el store en disco.
    Stage {
        component: String,
        #[arg(long = "input", value_name = "SLOT=LOCATOR", value_parser = parse_pair)]
        inputs: Vec<(String, String)>,
        #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_pair)]
        params: Vec<(String, String)>,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => Err(format!("expected NAME=VALUE, got `{raw}`")),
    }
}

fn overrides(pairs: &[(String, String)]) -> ParamOverrides {
    pairs.iter()
         .map(|(k, v)| (k.clone(), ParamValue::parse_literal(v)))
         .collect()
}

fn failure(e: &AppError) -> ExitCode {
    error!("{e}");
    eprintln!("error: {e}");
    match e {
        AppError::Build(_) | AppError::Usage(_) | AppError::Runtime(RuntimeError::Parameter(_)) => ExitCode::from(2),
        AppError::Runtime(RuntimeError::Rejected(_)) => ExitCode::from(1),
        _ => ExitCode::from(3),
    }
}

fn compile(config: &AppConfig, output: Option<PathBuf>, params: &[(String, String)]) -> Result<(), AppError> {
    let doc = compile_pipeline(config, &overrides(params))?;
    let path = output.unwrap_or_else(|| config.output.clone());
    let digest = Compiler::new(config.compiler_options()).write(&doc, &path)?;
    println!("{} {digest}", path.display());
    Ok(())
}

fn validate(file: &Path) -> ExitCode {
    let report = flow_validator::validate_path(file);
    print!("{}", report.render());
    ExitCode::from(report.exit_code() as u8)
}

fn load_document(config: &AppConfig, document: Option<PathBuf>) -> Result<CompiledDocument, AppError> {
    match document {
        Some(path) => {
            let text = std::fs::read_to_string(&path).map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;
            CompiledDocument::from_json(&text).map_err(|e| AppError::Config(format!("{}: {e}", path.display())))
        }
        None => compile_pipeline(config, &ParamOverrides::new()),
    }
}

fn run(config: &AppConfig, document: Option<PathBuf>, params: &[(String, String)]) -> Result<bool, AppError> {
    let doc = load_document(config, document)?;
    let store = FsArtifactStore::new(&config.artifact_root);
    let mut runtime = LocalRuntime::new(stage_registry(config)?, store);
    let run_id = runtime.submit(&doc, &overrides(params))?;
    let state = runtime.state(run_id)?;
    for task in &state.tasks {
        println!("{:<20} {:?} {}", task.task, task.status, task.fingerprint.as_deref().unwrap_or("-"));
    }
    match &state.status {
        RunStatus::Succeeded => {
            println!("run {run_id} succeeded ({})", state.run_fingerprint.as_deref().unwrap_or("-"));
            if let Some(artifact) = state.output(EVALUATION_ID, slots::METRICS) {
                let metrics: MetricsReport = runtime.load(artifact)
                                                    .map_err(|source| RuntimeError::Stage { stage: EVALUATION_ID.to_string(),
                                                                                            source })?;
                print!("{}", metrics.classification_report());
            }
            Ok(true)
        }
        RunStatus::Failed { task, code, message } => {
            eprintln!("run {run_id} failed at `{task}` [{code}]: {message}");
            Ok(false)
        }
        other => {
            eprintln!("run {run_id} ended in unexpected state {other:?}");
            Ok(false)
        }
    }
}

/// Falla si algún valor conserva un marcador del executor que el
/// orquestador debía sustituir.
fn ensure_resolved(flag: &str, pairs: &[(String, String)]) -> Result<(), AppError> {
    match pairs.iter().find(|(_, v)| v.contains(BINDING_MARKER)) {
        Some((name, value)) => Err(AppError::Usage(format!("{flag} {name}={value} was not resolved by the orchestrator"))),
        None => Ok(()),
    }
}

fn stage(config: &AppConfig,
         component: &str,
         inputs: &[(String, String)],
         params: &[(String, String)])
         -> Result<(), AppError> {
    ensure_resolved("--input", inputs)?;
    ensure_resolved("--param", params)?;
    let store = FsArtifactStore::new(&config.artifact_root);
    let mut runtime = LocalRuntime::new(stage_registry(config)?, store);
    let inputs: BTreeMap<String, String> = inputs.iter().cloned().collect();
    let outputs = runtime.run_stage(component, &inputs, &overrides(params))?;
    for (slot, artifact) in outputs {
        println!("{slot}={}", artifact.locator());
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init();
    let config: &AppConfig = &CONFIG;
    info!("artifact root {}", config.artifact_root.display());
    let outcome = match cli.command {
        Command::Compile { output, params } => compile(config, output, &params).map(|_| ExitCode::SUCCESS),
        Command::Validate { file } => Ok(validate(&file)),
        Command::Run { document, params } => run(config, document, &params).map(|ok| {
                                                                             if ok {
                                                                                 ExitCode::SUCCESS
                                                                             } else {
                                                                                 ExitCode::from(1)
                                                                             }
                                                                         }),
        Command::Stage { component, inputs, params } => {
            stage(config, &component, &inputs, &params).map(|_| ExitCode::SUCCESS)
        }
    };
    outcome.unwrap_or_else(|e| failure(&e))
}
