//! Parámetros tipados con restricciones declaradas.
//!
//! Cada stage declara `ParamSpec`s; el builder del grafo los resuelve una sola
//! vez (valor provisto o default) y valida cada uno contra su restricción.
//! Después de resueltos no se mutan.

mod merge;
mod spec;
mod value;

pub use merge::merge_overrides;
pub use spec::{Constraint, ParamSpec, ParamType, ResolvedParams, UNBOUNDED};
pub use value::ParamValue;

use std::collections::BTreeMap;

/// Valores provistos por el caller, por nombre de parámetro.
pub type ParamOverrides = BTreeMap<String, ParamValue>;
