//! Compila el pipeline Iris con los parámetros por defecto y escribe el
//! documento en la ubicación configurada (`IRISFLOW_OUTPUT`).
use irisflow::{compile_default, logging, CONFIG};
use tracing::{error, info};

fn main() {
    logging::init();
    match compile_default(&CONFIG) {
        Ok((path, digest)) => {
            info!("compiled pipeline written to {}", path.display());
            println!("{} {digest}", path.display());
        }
        Err(e) => {
            error!("compilation failed: {e}");
            std::process::exit(1);
        }
    }
}
