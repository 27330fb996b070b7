//! Route parameter values and their runtime schema

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::route::RouteId;
use crate::template::TemplateError;
use crate::RouterError;

/// A single parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Boolean(bool),
    Number(f64),
    String(String),
}

/// Parameter values of one route, keyed by parameter name
pub type ParameterValues = BTreeMap<String, ParameterValue>;

impl ParameterValue {
    pub fn kind(&self) -> ParameterKind {
        match self {
            ParameterValue::Boolean(_) => ParameterKind::Boolean,
            ParameterValue::Number(_) => ParameterKind::Number,
            ParameterValue::String(_) => ParameterKind::String,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParameterValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParameterValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Boolean(value) => write!(f, "{}", value),
            ParameterValue::Number(value) => write!(f, "{}", value),
            ParameterValue::String(value) => f.write_str(value),
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::String(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::String(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Boolean(value)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Number(value)
    }
}

impl From<i32> for ParameterValue {
    fn from(value: i32) -> Self {
        ParameterValue::Number(f64::from(value))
    }
}

impl From<u32> for ParameterValue {
    fn from(value: u32) -> Self {
        ParameterValue::Number(f64::from(value))
    }
}

/// Build a [`ParameterValues`] map from `name => value` pairs.
///
/// ```
/// use wp_router::parameters;
///
/// let values = parameters! { "id" => 7, "tab" => "profile" };
/// assert_eq!(values.len(), 2);
/// ```
#[macro_export]
macro_rules! parameters {
    () => {
        $crate::ParameterValues::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut values = $crate::ParameterValues::new();
        $(
            values.insert(
                ::std::string::String::from($name),
                $crate::ParameterValue::from($value),
            );
        )+
        values
    }};
}

/// Primitive kind a parameter must have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    String,
    Number,
    Boolean,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParameterKind::String => "string",
            ParameterKind::Number => "number",
            ParameterKind::Boolean => "boolean",
        })
    }
}

impl FromStr for ParameterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "string" => Ok(ParameterKind::String),
            "number" => Ok(ParameterKind::Number),
            "boolean" => Ok(ParameterKind::Boolean),
            other => Err(other.to_string()),
        }
    }
}

/// Declaration of a single parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParameterKind,
    pub required: bool,
}

impl ParameterSpec {
    pub fn required(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }
}

/// Ordered set of parameter declarations for one route
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSchema {
    specs: Vec<ParameterSpec>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schema, rejecting duplicate parameter names
    pub fn from_specs(specs: Vec<ParameterSpec>) -> Result<Self, TemplateError> {
        let mut schema = Self::new();
        for spec in specs {
            schema.push(spec)?;
        }
        Ok(schema)
    }

    /// Declare a required parameter
    pub fn required(self, name: impl Into<String>, kind: ParameterKind) -> Self {
        self.with(ParameterSpec::required(name, kind))
    }

    /// Declare an optional parameter
    pub fn optional(self, name: impl Into<String>, kind: ParameterKind) -> Self {
        self.with(ParameterSpec::optional(name, kind))
    }

    fn with(mut self, spec: ParameterSpec) -> Self {
        // Builder redeclarations replace the earlier spec
        self.specs.retain(|existing| existing.name != spec.name);
        self.specs.push(spec);
        self
    }

    pub(crate) fn push(&mut self, spec: ParameterSpec) -> Result<(), TemplateError> {
        if self.declares(&spec.name) {
            return Err(TemplateError::DuplicateParameter(spec.name));
        }
        self.specs.push(spec);
        Ok(())
    }

    /// Merge another schema into this one, rejecting duplicates
    pub(crate) fn extend(&mut self, other: ParameterSchema) -> Result<(), TemplateError> {
        for spec in other.specs {
            self.push(spec)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Check a fully resolved value set for `route` against this schema
    pub fn validate(&self, route: RouteId, values: &ParameterValues) -> Result<(), RouterError> {
        for (name, value) in values {
            let spec = self.get(name).ok_or_else(|| RouterError::UnexpectedParameter {
                route,
                name: name.clone(),
            })?;
            if spec.kind != value.kind() {
                return Err(RouterError::ParameterKind {
                    route,
                    name: name.clone(),
                    expected: spec.kind,
                    found: value.kind(),
                });
            }
        }

        if let Some(missing) = self
            .specs
            .iter()
            .find(|spec| spec.required && !values.contains_key(&spec.name))
        {
            return Err(RouterError::MissingParameter {
                route,
                name: missing.name.clone(),
            });
        }
        Ok(())
    }
}
