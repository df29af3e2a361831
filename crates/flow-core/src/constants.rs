//! Constantes del core.
//!
//! `ENGINE_VERSION` participa en los fingerprints de stage y de run: un cambio
//! incompatible del motor debe invalidarlos aunque la definición y los datos
//! no cambien.

/// Versión lógica del motor. Mantener estable mientras no haya cambios
/// incompatibles en el cálculo de fingerprints.
pub const ENGINE_VERSION: &str = "irisflow-core/1";

/// Etiqueta de SDK registrada en cada documento compilado.
pub const SDK_VERSION: &str = concat!("irisflow-sdk-", env!("CARGO_PKG_VERSION"));

/// Versión del esquema de documento compilado.
pub const DOCUMENT_SCHEMA_VERSION: &str = "1.0.0";

/// Nombre del campo de versión dentro de los payloads tipados.
pub const SCHEMA_VERSION_FIELD: &str = "schema_version";
