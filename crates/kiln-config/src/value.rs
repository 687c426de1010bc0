//! Uniform value tree shared by schema defaults, overrides and resolved data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A named collection of values (one nesting level of the tree).
pub type Table = BTreeMap<String, Value>;

/// Marker for a value that must be supplied before resolution succeeds.
pub const MISSING: &str = "???";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Section(Table),
    Null,
}

impl Value {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Section(_) => "section",
            Self::Null => "null",
        }
    }

    /// Rendering used in error messages, e.g. `"ten" (string)`.
    #[must_use]
    pub fn describe(&self) -> String {
        format!("{self} ({})", self.type_name())
    }

    /// Text form of a scalar for embedding in a larger string.
    #[must_use]
    pub fn render_scalar(&self) -> Option<String> {
        match self {
            Self::Bool(b) => Some(b.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(format_float(*f)),
            Self::String(s) => Some(s.clone()),
            Self::List(_) | Self::Section(_) | Self::Null => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_section(&self) -> Option<&Table> {
        match self {
            Self::Section(t) => Some(t),
            _ => None,
        }
    }

    /// True for the `???` marker.
    #[must_use]
    pub fn is_missing_marker(&self) -> bool {
        matches!(self, Self::String(s) if s == MISSING)
    }

    /// True when the value still holds a `${...}` reference.
    #[must_use]
    pub fn has_interpolation(&self) -> bool {
        match self {
            Self::String(s) => s.contains("${"),
            Self::List(items) => items.iter().any(Self::has_interpolation),
            Self::Section(t) => t.values().any(Self::has_interpolation),
            _ => false,
        }
    }

    /// Empty strings and lists do not satisfy a required field.
    #[must_use]
    pub fn is_empty_value(&self) -> bool {
        match self {
            Self::String(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Null => true,
            _ => false,
        }
    }

    /// Walk a dotted path from this node.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Self> {
        path.split('.').try_fold(self, |node, segment| node.as_section()?.get(segment))
    }
}

/// Walk a dotted path starting at a table.
#[must_use]
pub fn lookup<'a>(table: &'a Table, path: &str) -> Option<&'a Value> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    let node = table.get(head)?;
    match rest {
        Some(rest) => node.lookup(rest),
        None => Some(node),
    }
}

fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => f.write_str(&format_float(*x)),
            Self::String(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Section(table) => {
                f.write_str("{")?;
                for (idx, (key, item)) in table.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {key} = {item}")?;
                }
                f.write_str(" }")
            }
            Self::Null => f.write_str("null"),
        }
    }
}

impl From<toml::Value> for Value {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::Boolean(b) => Self::Bool(b),
            toml::Value::Integer(i) => Self::Integer(i),
            toml::Value::Float(f) => Self::Float(f),
            toml::Value::String(s) => Self::String(s),
            toml::Value::Datetime(dt) => Self::String(dt.to_string()),
            toml::Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            toml::Value::Table(table) => {
                Self::Section(table.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Table> for Value {
    fn from(table: Table) -> Self {
        Self::Section(table)
    }
}
