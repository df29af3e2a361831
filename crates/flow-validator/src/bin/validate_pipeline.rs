//! Gate de CI: valida un documento compilado. Código de salida 0 si es
//! válido, 1 en cualquier otro caso.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "validate-pipeline", about = "Structural check of a compiled pipeline document")]
struct Args {
    /// Documento a validar.
    #[arg(default_value = "components/pipeline.json")]
    path: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let report = flow_validator::validate_path(&args.path);
    print!("{}", report.render());
    if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
