//! Stores de artifacts direccionados por contenido.
//!
//! El locator de un artifact deriva del hash del sobre canónico
//! `{kind, producer, provenance, schemaVersion, payload}`. Consecuencias:
//! - `put` nunca sobrescribe: mismo contenido => mismo locator, contenido
//!   distinto => locator distinto.
//! - Re-ejecutar un stage con los mismos inputs es idempotente.
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use thiserror::Error;

use super::typed_artifact::payload_schema_version;
use super::{ArtifactKind, ArtifactRef, Provenance};
use crate::hashing::hash_value;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("artifact not found: {0}")]
    NotFound(String),
    #[error("artifact `{locator}` is a {found}, expected {expected}")]
    KindMismatch {
        locator: String,
        expected: ArtifactKind,
        found: ArtifactKind,
    },
    #[error("corrupt artifact envelope at `{0}`")]
    CorruptEnvelope(String),
    #[error("artifact io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("artifact serialization: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Almacenamiento de artifacts inmutables.
pub trait ArtifactStore {
    /// Guarda un payload y devuelve su referencia. Nunca sobrescribe.
    fn put(&mut self,
           kind: ArtifactKind,
           producer: &str,
           provenance: Provenance,
           payload: Value)
           -> Result<ArtifactRef, StoreError>;

    /// Recupera el payload de un artifact verificando su kind.
    fn get(&self, artifact: &ArtifactRef) -> Result<Value, StoreError>;

    /// Reconstruye la referencia a partir de un locator existente.
    fn describe(&self, locator: &str) -> Result<ArtifactRef, StoreError>;

    fn contains(&self, locator: &str) -> bool;
}

/// Sobre persistido junto al payload.
fn envelope(kind: ArtifactKind, producer: &str, provenance: Provenance, payload: Value) -> (Value, u32, String) {
    let schema_version = payload_schema_version(&payload).unwrap_or(1);
    let env = json!({
        "kind": kind,
        "producer": producer,
        "provenance": provenance,
        "schemaVersion": schema_version,
        "payload": payload,
    });
    let hash = hash_value(&env);
    (env, schema_version, hash)
}

fn ref_from_envelope(locator: &str, env: &Value) -> Result<ArtifactRef, StoreError> {
    let corrupt = || StoreError::CorruptEnvelope(locator.to_string());
    let kind: ArtifactKind = serde_json::from_value(env.get("kind").cloned().ok_or_else(corrupt)?)?;
    let provenance: Provenance = serde_json::from_value(env.get("provenance").cloned().ok_or_else(corrupt)?)?;
    let producer = env.get("producer").and_then(Value::as_str).ok_or_else(corrupt)?;
    let schema_version = env.get("schemaVersion")
                            .and_then(Value::as_u64)
                            .and_then(|v| u32::try_from(v).ok())
                            .ok_or_else(corrupt)?;
    Ok(ArtifactRef::new(kind, locator.to_string(), producer.to_string(), schema_version, provenance))
}

fn payload_of(artifact: &ArtifactRef, env: Value) -> Result<Value, StoreError> {
    let stored = ref_from_envelope(artifact.locator(), &env)?;
    if stored.kind() != artifact.kind() {
        return Err(StoreError::KindMismatch { locator: artifact.locator().to_string(),
                                              expected: artifact.kind(),
                                              found: stored.kind() });
    }
    match env {
        Value::Object(mut map) => map.remove("payload")
                                     .ok_or_else(|| StoreError::CorruptEnvelope(artifact.locator().to_string())),
        _ => Err(StoreError::CorruptEnvelope(artifact.locator().to_string())),
    }
}

/// Store en memoria (tests y runtime local).
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    inner: HashMap<String, Value>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn put(&mut self,
           kind: ArtifactKind,
           producer: &str,
           provenance: Provenance,
           payload: Value)
           -> Result<ArtifactRef, StoreError> {
        let (env, schema_version, hash) = envelope(kind, producer, provenance, payload);
        let locator = format!("mem://{}/{}", kind.dir_name(), hash);
        self.inner.entry(locator.clone()).or_insert(env);
        Ok(ArtifactRef::new(kind, locator, producer.to_string(), schema_version, provenance))
    }

    fn get(&self, artifact: &ArtifactRef) -> Result<Value, StoreError> {
        let env = self.inner
                      .get(artifact.locator())
                      .cloned()
                      .ok_or_else(|| StoreError::NotFound(artifact.locator().to_string()))?;
        payload_of(artifact, env)
    }

    fn describe(&self, locator: &str) -> Result<ArtifactRef, StoreError> {
        let env = self.inner
                      .get(locator)
                      .ok_or_else(|| StoreError::NotFound(locator.to_string()))?;
        ref_from_envelope(locator, env)
    }

    fn contains(&self, locator: &str) -> bool {
        self.inner.contains_key(locator)
    }
}

/// Store en disco: `<root>/<kind>/<hash>.json`. El locator es la ruta.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_envelope(&self, locator: &str) -> Result<Value, StoreError> {
        let path = Path::new(locator);
        if !path.exists() {
            return Err(StoreError::NotFound(locator.to_string()));
        }
        let bytes = fs::read(path).map_err(|source| StoreError::Io { path: path.to_path_buf(),
                                                                      source })?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl ArtifactStore for FsArtifactStore {
    fn put(&mut self,
           kind: ArtifactKind,
           producer: &str,
           provenance: Provenance,
           payload: Value)
           -> Result<ArtifactRef, StoreError> {
        let (env, schema_version, hash) = envelope(kind, producer, provenance, payload);
        let dir = self.root.join(kind.dir_name());
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io { path: dir.clone(),
                                                                    source })?;
        let path = dir.join(format!("{hash}.json"));
        if !path.exists() {
            // escritura atómica: tmp + rename, así un lector nunca ve un sobre a medias
            let tmp = dir.join(format!(".{hash}.tmp"));
            let bytes = serde_json::to_vec_pretty(&env)?;
            fs::write(&tmp, bytes).map_err(|source| StoreError::Io { path: tmp.clone(),
                                                                      source })?;
            fs::rename(&tmp, &path).map_err(|source| StoreError::Io { path: path.clone(),
                                                                       source })?;
        }
        let locator = path.to_string_lossy().into_owned();
        Ok(ArtifactRef::new(kind, locator, producer.to_string(), schema_version, provenance))
    }

    fn get(&self, artifact: &ArtifactRef) -> Result<Value, StoreError> {
        let env = self.read_envelope(artifact.locator())?;
        payload_of(artifact, env)
    }

    fn describe(&self, locator: &str) -> Result<ArtifactRef, StoreError> {
        let env = self.read_envelope(locator)?;
        ref_from_envelope(locator, &env)
    }

    fn contains(&self, locator: &str) -> bool {
        Path::new(locator).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_same_locator_and_no_overwrite() {
        let mut store = InMemoryArtifactStore::new();
        let a = store.put(ArtifactKind::Dataset, "extract", Provenance::Remote, json!({"rows": 1, "schema_version": 1}))
                     .unwrap();
        let b = store.put(ArtifactKind::Dataset, "extract", Provenance::Remote, json!({"schema_version": 1, "rows": 1}))
                     .unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);

        let c = store.put(ArtifactKind::Dataset, "extract", Provenance::Fallback, json!({"rows": 1, "schema_version": 1}))
                     .unwrap();
        assert_ne!(a.locator(), c.locator());
        assert_eq!(c.provenance(), Provenance::Fallback);
    }

    #[test]
    fn get_checks_kind() {
        let mut store = InMemoryArtifactStore::new();
        let a = store.put(ArtifactKind::Model, "train", Provenance::Derived, json!({"schema_version": 1}))
                     .unwrap();
        let forged = ArtifactRef::new(ArtifactKind::Dataset,
                                      a.locator().to_string(),
                                      "train".into(),
                                      1,
                                      Provenance::Derived);
        assert!(matches!(store.get(&forged), Err(StoreError::KindMismatch { .. })));
        assert_eq!(store.get(&a).unwrap(), json!({"schema_version": 1}));
    }

    #[test]
    fn fs_store_roundtrip_and_describe() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FsArtifactStore::new(dir.path());
        let a = store.put(ArtifactKind::Metrics, "evaluate", Provenance::Derived, json!({"accuracy": 1.0, "schema_version": 1}))
                     .unwrap();
        assert!(store.contains(a.locator()));
        assert!(a.locator().contains("metrics"));
        let again = store.describe(a.locator()).unwrap();
        assert_eq!(again, a);
        assert_eq!(store.get(&a).unwrap()["accuracy"], json!(1.0));
    }
}
