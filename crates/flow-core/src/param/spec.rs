use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ParamOverrides, ParamValue};
use crate::errors::ParameterError;

/// Literal aceptado por `IntOrUnbounded` para "sin límite".
pub const UNBOUNDED: &str = "unbounded";

/// Tipo declarado de un parámetro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParamType {
    String,
    Float,
    Int,
    IntOrUnbounded,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
                        ParamType::String => "string",
                        ParamType::Float => "float",
                        ParamType::Int => "int",
                        ParamType::IntOrUnbounded => "int or \"unbounded\"",
                    })
    }
}

/// Restricción de validación de un parámetro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub enum Constraint {
    Any,
    NonEmpty,
    /// `min < x < max`
    OpenInterval { min: f64, max: f64 },
    /// `x >= min`
    AtLeast { min: i64 },
    /// `x >= min` o el literal `unbounded`
    AtLeastOrUnbounded { min: i64 },
    OneOf { values: Vec<String> },
}

impl Constraint {
    pub fn check(&self, value: &ParamValue) -> bool {
        match self {
            Constraint::Any => true,
            Constraint::NonEmpty => value.as_str().is_some_and(|s| !s.trim().is_empty()),
            Constraint::OpenInterval { min, max } => value.as_f64().is_some_and(|x| x > *min && x < *max),
            Constraint::AtLeast { min } => value.as_i64().is_some_and(|x| x >= *min),
            Constraint::AtLeastOrUnbounded { min } => match value {
                ParamValue::Int(x) => x >= min,
                ParamValue::Text(s) => s == UNBOUNDED,
                ParamValue::Float(_) => false,
            },
            Constraint::OneOf { values } => value.as_str().is_some_and(|s| values.iter().any(|v| v == s)),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Any => f.write_str("any"),
            Constraint::NonEmpty => f.write_str("non-empty string"),
            Constraint::OpenInterval { min, max } => write!(f, "{min} < x < {max}"),
            Constraint::AtLeast { min } => write!(f, "x >= {min}"),
            Constraint::AtLeastOrUnbounded { min } => write!(f, "x >= {min} or \"{UNBOUNDED}\""),
            Constraint::OneOf { values } => write!(f, "one of [{}]", values.join(", ")),
        }
    }
}

/// Declaración inmutable de un parámetro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub ty: ParamType,
    pub default: ParamValue,
    pub constraint: Constraint,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl ParamSpec {
    pub fn new(name: &str, ty: ParamType, default: impl Into<ParamValue>, constraint: Constraint) -> Self {
        Self { name: name.to_string(),
               ty,
               default: default.into(),
               constraint,
               description: String::new() }
    }

    /// String no vacío.
    pub fn string(name: &str, default: &str) -> Self {
        Self::new(name, ParamType::String, default, Constraint::NonEmpty)
    }

    pub fn float(name: &str, default: f64) -> Self {
        Self::new(name, ParamType::Float, default, Constraint::Any)
    }

    pub fn int(name: &str, default: i64) -> Self {
        Self::new(name, ParamType::Int, default, Constraint::Any)
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = constraint;
        self
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Resuelve el valor provisto (o el default) a un valor del tipo
    /// declarado y lo valida contra la restricción.
    pub fn resolve(&self, supplied: Option<&ParamValue>) -> Result<ParamValue, ParameterError> {
        let raw = supplied.unwrap_or(&self.default);
        let value = self.coerce(raw)?;
        if !self.constraint.check(&value) {
            return Err(ParameterError::ConstraintViolated { name: self.name.clone(),
                                                            constraint: self.constraint.to_string(),
                                                            value: value.to_string() });
        }
        Ok(value)
    }

    fn coerce(&self, raw: &ParamValue) -> Result<ParamValue, ParameterError> {
        let mismatch = || ParameterError::TypeMismatch { name: self.name.clone(),
                                                         expected: self.ty.to_string(),
                                                         found: raw.type_name().to_string() };
        match (self.ty, raw) {
            (ParamType::String, ParamValue::Text(_)) => Ok(raw.clone()),
            (ParamType::Float, ParamValue::Float(_)) => Ok(raw.clone()),
            (ParamType::Float, ParamValue::Int(i)) => Ok(ParamValue::Float(*i as f64)),
            (ParamType::Int, ParamValue::Int(_)) => Ok(raw.clone()),
            (ParamType::IntOrUnbounded, ParamValue::Int(_)) => Ok(raw.clone()),
            (ParamType::IntOrUnbounded, ParamValue::Text(s)) if s.trim().eq_ignore_ascii_case(UNBOUNDED) => {
                Ok(ParamValue::Text(UNBOUNDED.to_string()))
            }
            _ => Err(mismatch()),
        }
    }

    /// Mismo contrato (tipo, default y restricción); la descripción no cuenta.
    pub fn same_contract(&self, other: &ParamSpec) -> bool {
        self.name == other.name && self.ty == other.ty && self.default == other.default && self.constraint == other.constraint
    }
}

/// Parámetros ya resueltos y validados.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedParams(BTreeMap<String, ParamValue>);

impl ResolvedParams {
    /// Resuelve `specs` contra `overrides`. Un override sin spec es un error.
    pub fn resolve(specs: &[ParamSpec], overrides: &ParamOverrides) -> Result<Self, ParameterError> {
        if let Some(unknown) = overrides.keys().find(|k| !specs.iter().any(|s| &s.name == *k)) {
            return Err(ParameterError::Unknown { name: unknown.clone() });
        }
        let mut out = BTreeMap::new();
        for spec in specs {
            out.insert(spec.name.clone(), spec.resolve(overrides.get(&spec.name))?);
        }
        Ok(Self(out))
    }

    /// Subconjunto con los parámetros declarados por `specs`.
    pub fn subset(&self, specs: &[ParamSpec]) -> Result<Self, ParameterError> {
        let mut out = BTreeMap::new();
        for spec in specs {
            let v = self.get(&spec.name)?;
            out.insert(spec.name.clone(), v.clone());
        }
        Ok(Self(out))
    }

    pub fn get(&self, name: &str) -> Result<&ParamValue, ParameterError> {
        self.0
            .get(name)
            .ok_or_else(|| ParameterError::Missing { name: name.to_string() })
    }

    pub fn text(&self, name: &str) -> Result<&str, ParameterError> {
        let v = self.get(name)?;
        v.as_str().ok_or_else(|| type_error(name, "string", v))
    }

    pub fn float(&self, name: &str) -> Result<f64, ParameterError> {
        let v = self.get(name)?;
        v.as_f64().ok_or_else(|| type_error(name, "float", v))
    }

    pub fn int(&self, name: &str) -> Result<i64, ParameterError> {
        let v = self.get(name)?;
        v.as_i64().ok_or_else(|| type_error(name, "int", v))
    }

    /// Límite opcional: `None` significa sin límite.
    pub fn limit(&self, name: &str) -> Result<Option<usize>, ParameterError> {
        match self.get(name)? {
            ParamValue::Int(i) => usize::try_from(*i).map(Some)
                                                     .map_err(|_| ParameterError::ConstraintViolated { name: name.to_string(),
                                                                                                       constraint: "x >= 0".into(),
                                                                                                       value: i.to_string() }),
            ParamValue::Text(s) if s == UNBOUNDED => Ok(None),
            other => Err(type_error(name, "int or \"unbounded\"", other)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, ParamValue> {
        &self.0
    }
}

fn type_error(name: &str, expected: &str, found: &ParamValue) -> ParameterError {
    ParameterError::TypeMismatch { name: name.to_string(),
                                   expected: expected.to_string(),
                                   found: found.type_name().to_string() }
}
