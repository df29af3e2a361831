//! Payloads tipados para artifacts.
//!
//! Un tipo que implementa `ArtifactSpec` declara su `ArtifactKind` y versión
//! de esquema; el store guarda el payload JSON y la decodificación verifica
//! kind y versión antes de deserializar.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::ArtifactKind;
use crate::constants::SCHEMA_VERSION_FIELD;

/// Errores posibles al codificar/decodificar un artifact tipado.
#[derive(Debug, Error)]
pub enum ArtifactDecodeError {
    #[error("artifact kind mismatch: expected {expected}, found {found}")]
    KindMismatch { expected: ArtifactKind, found: ArtifactKind },
    #[error("schema version mismatch: expected {expected}, found {found:?}")]
    VersionMismatch { expected: u32, found: Option<u32> },
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("serde: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("validation: {0}")]
    Validation(String),
}

/// Especificación de un payload tipado.
pub trait ArtifactSpec: Sized + Serialize + DeserializeOwned {
    /// Kind asociado (permite distinguir en runtime).
    const KIND: ArtifactKind;
    /// Versión de esquema (incrementar en cambios incompatibles).
    const SCHEMA_VERSION: u32 = 1;

    /// Validación semántica ligera (sin efectos secundarios).
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Serializa a payload JSON garantizando el campo de versión.
    fn to_payload(&self) -> Result<Value, ArtifactDecodeError> {
        self.validate().map_err(ArtifactDecodeError::Validation)?;
        let mut value = serde_json::to_value(self)?;
        match &mut value {
            Value::Object(map) => {
                map.entry(SCHEMA_VERSION_FIELD.to_string())
                   .or_insert(Value::from(Self::SCHEMA_VERSION));
            }
            _ => return Err(ArtifactDecodeError::NotAnObject),
        }
        Ok(value)
    }

    /// Decodifica un payload verificando kind, versión y validación.
    fn from_payload(kind: ArtifactKind, payload: Value) -> Result<Self, ArtifactDecodeError> {
        if kind != Self::KIND {
            return Err(ArtifactDecodeError::KindMismatch { expected: Self::KIND,
                                                           found: kind });
        }
        let found = payload_schema_version(&payload);
        if found != Some(Self::SCHEMA_VERSION) {
            return Err(ArtifactDecodeError::VersionMismatch { expected: Self::SCHEMA_VERSION,
                                                              found });
        }
        let decoded: Self = serde_json::from_value(payload)?;
        decoded.validate().map_err(ArtifactDecodeError::Validation)?;
        Ok(decoded)
    }
}

/// Lee el campo de versión de un payload, si existe.
pub fn payload_schema_version(payload: &Value) -> Option<u32> {
    payload.get(SCHEMA_VERSION_FIELD)
           .and_then(|v| v.as_u64())
           .and_then(|v| u32::try_from(v).ok())
}
