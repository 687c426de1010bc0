//! Merge defaults with overrides, interpolate, validate, freeze.

use crate::coerce::{coerce_leaf, mismatch, parse_inline_table};
use crate::error::{ConfigError, ConfigResult};
use crate::interpolate::resolve_interpolations;
use crate::overrides::OverrideSource;
use crate::schema::{join_path, FieldSpec, FieldType, Presence, Schema};
use crate::value::{lookup, Table, Value, MISSING};
use serde::de::DeserializeOwned;
use std::fmt;

/// Resolve `overrides` against `schema` using the process environment for
/// `${env:...}` references.
pub fn resolve(schema: &Schema, overrides: &OverrideSource) -> ConfigResult<ResolvedConfig> {
    resolve_with_env(schema, overrides, &|name: &str| std::env::var(name).ok())
}

pub fn resolve_with_env(
    schema: &Schema,
    overrides: &OverrideSource,
    env: &dyn Fn(&str) -> Option<String>,
) -> ConfigResult<ResolvedConfig> {
    let mut root = schema.default_instance();

    for entry in overrides.in_precedence_order() {
        let segments: Vec<&str> = entry.path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ConfigError::InvalidOverride {
                arg: entry.path.clone(),
                reason: "malformed dotted path".to_string(),
            });
        }
        tracing::trace!(path = %entry.path, origin = %entry.origin, "applying override");
        assign(&mut root, schema, &segments, &entry.path, entry.value.clone())?;
    }

    resolve_interpolations(&mut root, env)?;
    validate_section(&mut root, schema, "")?;

    Ok(ResolvedConfig { root })
}

fn assign(table: &mut Table, schema: &Schema, segments: &[&str], full_path: &str, value: Value) -> ConfigResult<()> {
    let Some((head, rest)) = segments.split_first() else {
        return Err(ConfigError::unknown(full_path));
    };
    let field = schema.field(head).ok_or_else(|| ConfigError::unknown(full_path))?;

    if rest.is_empty() {
        match assign_value(field, value, full_path)? {
            Some(value) => table.insert(field.name.clone(), value),
            None => table.remove(&field.name),
        };
        return Ok(());
    }

    let Some(nested) = field.nested() else {
        return Err(ConfigError::unknown(full_path));
    };
    let entry = table.entry(field.name.clone()).or_insert_with(|| Value::Section(nested.default_instance()));
    if !matches!(entry, Value::Section(_)) {
        *entry = Value::Section(nested.default_instance());
    }
    match entry {
        Value::Section(sub) => assign(sub, nested, rest, full_path, value),
        _ => Err(ConfigError::unknown(full_path)),
    }
}

/// `None` unsets the field.
fn assign_value(field: &FieldSpec, value: Value, path: &str) -> ConfigResult<Option<Value>> {
    if value.is_missing_marker() {
        return Ok(Some(Value::String(MISSING.to_string())));
    }
    if field.presence == Presence::Optional && is_null(&value) {
        return Ok(None);
    }
    if let FieldType::Section(nested) = &field.ty {
        // A table (or inline-table string) is split into leaves, each of which
        // defers its own interpolation. Only a bare `${...}` is kept raw.
        let is_table = match &value {
            Value::Section(_) => true,
            Value::String(raw) => parse_inline_table(raw).is_some(),
            _ => false,
        };
        if !is_table && value.has_interpolation() {
            return Ok(Some(value));
        }
        return replace_section(nested, value, path).map(|t| Some(Value::Section(t)));
    }
    if value.has_interpolation() {
        return Ok(Some(value));
    }
    coerce_leaf(value, &field.ty, path).map(Some)
}

fn is_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => matches!(s.trim(), "null" | "~"),
        _ => false,
    }
}

/// Whole-subtree assignment: start from the section defaults and apply only
/// what `value` names. Earlier overrides inside the subtree are discarded.
fn replace_section(schema: &Schema, value: Value, path: &str) -> ConfigResult<Table> {
    let given = match value {
        Value::Section(table) => table,
        Value::String(raw) => {
            parse_inline_table(&raw).ok_or_else(|| mismatch(path, &FieldType::Section(schema.clone()), &Value::String(raw)))?
        }
        other => return Err(mismatch(path, &FieldType::Section(schema.clone()), &other)),
    };

    let mut table = schema.default_instance();
    for (key, item) in given {
        let child = join_path(path, &key);
        assign(&mut table, schema, &[key.as_str()], &child, item)?;
    }
    Ok(table)
}

/// Final pass: every present leaf is coerced again (interpolated values have
/// not been checked yet), defaults are restored in sections produced by
/// interpolation, and required fields must be present and non-empty.
fn validate_section(table: &mut Table, schema: &Schema, prefix: &str) -> ConfigResult<()> {
    if let Some(key) = table.keys().find(|key| schema.field(key).is_none()) {
        return Err(ConfigError::unknown(&join_path(prefix, key)));
    }

    for field in schema.fields() {
        let path = join_path(prefix, &field.name);
        let Some(current) = table.remove(&field.name) else {
            match &field.presence {
                Presence::Required => return Err(ConfigError::missing(&path)),
                Presence::Default(value) => {
                    table.insert(field.name.clone(), value.clone());
                }
                Presence::Optional => {}
            }
            continue;
        };

        if current.is_missing_marker() {
            return Err(ConfigError::missing(&path));
        }

        let checked = match (&field.ty, current) {
            (FieldType::Section(nested), Value::Section(mut sub)) => {
                validate_section(&mut sub, nested, &path)?;
                Value::Section(sub)
            }
            (FieldType::Section(_), other) => return Err(mismatch(&path, &field.ty, &other)),
            (ty, other) => coerce_leaf(other, ty, &path)?,
        };

        if field.presence == Presence::Required && checked.is_empty_value() {
            return Err(ConfigError::missing(&path));
        }
        table.insert(field.name.clone(), checked);
    }
    Ok(())
}

/// A fully merged, interpolated and type-checked configuration.
///
/// There is no mutable access; collaborators receive decoded copies of
/// their sections.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    root: Table,
}

impl ResolvedConfig {
    #[must_use]
    pub fn as_table(&self) -> &Table {
        &self.root
    }

    /// Value at a dotted path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.root, path)
    }

    /// Decode one section into a collaborator's configuration type.
    pub fn section<T: DeserializeOwned>(&self, name: &str) -> ConfigResult<T> {
        let decode_err = |message: String| ConfigError::SectionDecode { section: name.to_string(), message };
        let value = self.get(name).ok_or_else(|| ConfigError::unknown(name))?;
        let json = serde_json::to_value(value).map_err(|e| decode_err(e.to_string()))?;
        serde_json::from_value(json).map_err(|e| decode_err(e.to_string()))
    }

    /// Human-readable TOML rendering, as logged at startup.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(&self.root).map_err(|e| ConfigError::Render(e.to_string()))
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.root).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_toml_string() {
            Ok(rendered) => f.write_str(&rendered),
            Err(_) => write!(f, "{}", Value::Section(self.root.clone())),
        }
    }
}
