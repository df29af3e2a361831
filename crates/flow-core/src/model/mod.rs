//! Modelo de artifacts: referencias tipadas, payloads tipados y stores.

pub mod artifact;
#[macro_use]
pub mod macros;
pub mod store;
pub mod typed_artifact;

pub use artifact::{ArtifactKind, ArtifactRef, Provenance};
pub use store::{ArtifactStore, FsArtifactStore, InMemoryArtifactStore, StoreError};
pub use typed_artifact::{ArtifactDecodeError, ArtifactSpec};
