//! Referencias a artifacts intercambiados entre stages.
//!
//! Un `ArtifactRef` no contiene datos: apunta por `locator` al contenido
//! guardado en un `ArtifactStore`. Sólo los stores construyen referencias, y
//! el locator deriva del hash del contenido, así que un artifact nuevo
//! siempre tiene un locator nuevo y nunca se sobrescribe uno existente.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tipos de artifact que pueden fluir entre stages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    Dataset,
    Model,
    Metrics,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Dataset => "Dataset",
            ArtifactKind::Model => "Model",
            ArtifactKind::Metrics => "Metrics",
        }
    }

    /// Nombre del subdirectorio usado por los stores basados en rutas.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ArtifactKind::Dataset => "dataset",
            ArtifactKind::Model => "model",
            ArtifactKind::Metrics => "metrics",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origen de los datos de un artifact.
///
/// `Remote` y `Fallback` sólo aparecen en el dataset de extracción; el resto
/// de artifacts son `Derived`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Remote,
    Fallback,
    Derived,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
                        Provenance::Remote => "remote",
                        Provenance::Fallback => "fallback",
                        Provenance::Derived => "derived",
                    })
    }
}

/// Referencia inmutable a un artifact producido por un stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRef {
    kind: ArtifactKind,
    locator: String,
    producer_stage_id: String,
    schema_version: u32,
    provenance: Provenance,
}

impl ArtifactRef {
    pub(crate) fn new(kind: ArtifactKind,
                      locator: String,
                      producer_stage_id: String,
                      schema_version: u32,
                      provenance: Provenance)
                      -> Self {
        Self { kind,
               locator,
               producer_stage_id,
               schema_version,
               provenance }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn producer_stage_id(&self) -> &str {
        &self.producer_stage_id
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }
}
