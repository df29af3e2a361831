//! Macro para declarar payloads tipados sin boilerplate.
//!
//! ```ignore
//! typed_artifact!(
//!     /// Tabla de features.
//!     DatasetTable { rows: Vec<Vec<f64>> } kind: ArtifactKind::Dataset
//! );
//! ```
//!
//! Genera un struct con campos públicos más `schema_version: u32` y su
//! implementación de `ArtifactSpec`. Con `, validate(me) { .. }` tras el kind
//! se añade la validación semántica. El crate que lo usa debe depender de
//! `serde`.

#[macro_export]
macro_rules! typed_artifact {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$fmeta:meta])* $fname:ident : $fty:ty),+ $(,)? } kind: $kind:expr
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        pub struct $name {
            $($(#[$fmeta])* pub $fname: $fty,)+
            pub schema_version: u32,
        }

        impl $crate::model::ArtifactSpec for $name {
            const KIND: $crate::model::ArtifactKind = $kind;
        }
    };
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$fmeta:meta])* $fname:ident : $fty:ty),+ $(,)? } kind: $kind:expr,
        validate($me:ident) $body:block
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        pub struct $name {
            $($(#[$fmeta])* pub $fname: $fty,)+
            pub schema_version: u32,
        }

        impl $crate::model::ArtifactSpec for $name {
            const KIND: $crate::model::ArtifactKind = $kind;

            fn validate(&self) -> Result<(), String> {
                let $me = self;
                $body
            }
        }
    };
}
