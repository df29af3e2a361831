//! Suscriptor `tracing` para los binarios. Los registros del facade `log`
//! emitidos por los crates del workspace llegan por el puente `tracing-log`.
use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static INIT: OnceCell<()> = OnceCell::new();

/// Instala el suscriptor una sola vez, escribiendo en stderr. Filtro de
/// `RUST_LOG`, `info` si no está definido.
pub fn init() {
    INIT.get_or_init(|| {
            let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
            // stdout queda para la salida de los comandos (`slot=locator`).
            // Otro suscriptor global (p. ej. en tests) no es un error.
            let _ = tracing_subscriber::fmt().with_env_filter(filter)
                                             .with_target(false)
                                             .with_writer(std::io::stderr)
                                             .try_init();
        });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_is_idempotent() {
        super::init();
        super::init();
        log::info!("logging ready");
    }
}
