//! Ordered override sources.
//!
//! Precedence: schema defaults < file overrides < CLI overrides. Within one
//! origin the later entry wins.

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{join_path, Schema};
use crate::source::load_config_file;
use crate::value::{Table, Value};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideOrigin {
    File(PathBuf),
    Cli,
}

impl fmt::Display for OverrideOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Cli => f.write_str("command line"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    pub path: String,
    pub value: Value,
    pub origin: OverrideOrigin,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideSource {
    overrides: Vec<Override>,
}

impl OverrideSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<String>, value: impl Into<Value>, origin: OverrideOrigin) {
        self.overrides.push(Override { path: path.into(), value: value.into(), origin });
    }

    /// Load a config file and append its leaves.
    pub fn with_file(mut self, path: &Path, schema: &Schema) -> ConfigResult<Self> {
        let table = load_config_file(path)?;
        self.extend_from_table(table, schema, &OverrideOrigin::File(path.to_path_buf()));
        Ok(self)
    }

    /// Append every leaf of `table`. Nested tables that line up with schema
    /// sections are descended into, so a file only touches the leaves it names.
    pub fn extend_from_table(&mut self, table: Table, schema: &Schema, origin: &OverrideOrigin) {
        flatten_into(&mut self.overrides, table, Some(schema), "", origin);
    }

    /// Parse `dotted.path=value` arguments.
    pub fn with_cli_args<I, S>(mut self, args: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            let (path, raw) = parse_cli_override(arg.as_ref())?;
            self.push(path, Value::String(raw), OverrideOrigin::Cli);
        }
        Ok(self)
    }

    /// Overrides in application order: file-sourced first, then CLI, each
    /// group keeping its insertion order.
    pub fn in_precedence_order(&self) -> impl Iterator<Item = &Override> {
        let files = self.overrides.iter().filter(|o| matches!(o.origin, OverrideOrigin::File(_)));
        let cli = self.overrides.iter().filter(|o| o.origin == OverrideOrigin::Cli);
        files.chain(cli)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Override> {
        self.overrides.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

impl FromIterator<Override> for OverrideSource {
    fn from_iter<I: IntoIterator<Item = Override>>(iter: I) -> Self {
        Self { overrides: iter.into_iter().collect() }
    }
}

fn flatten_into(out: &mut Vec<Override>, table: Table, schema: Option<&Schema>, prefix: &str, origin: &OverrideOrigin) {
    for (key, value) in table {
        let path = join_path(prefix, &key);
        let nested = schema.and_then(|s| s.field(&key)).and_then(|f| f.nested());
        match (value, nested) {
            (Value::Section(inner), Some(nested)) => flatten_into(out, inner, Some(nested), &path, origin),
            (value, _) => out.push(Override { path, value, origin: origin.clone() }),
        }
    }
}

/// Split `dotted.path=value`. Surrounding quotes on the value are stripped.
pub fn parse_cli_override(arg: &str) -> ConfigResult<(String, String)> {
    let invalid = |reason: &str| ConfigError::InvalidOverride { arg: arg.to_string(), reason: reason.to_string() };

    if arg.starts_with('+') || arg.starts_with('~') {
        return Err(invalid("adding or deleting keys is not supported; every field is declared by the schema"));
    }
    let (path, raw) = arg.split_once('=').ok_or_else(|| invalid("expected dotted.path=value"))?;
    let path = path.trim();
    if path.is_empty() || path.split('.').any(|segment| segment.is_empty() || segment.contains(char::is_whitespace)) {
        return Err(invalid("malformed dotted path"));
    }
    Ok((path.to_string(), unquote(raw.trim()).to_string()))
}

fn unquote(raw: &str) -> &str {
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;

    fn schema() -> Schema {
        let trainer = Schema::builder("trainer").field("max_epochs", FieldType::Integer, 10).build().unwrap();
        Schema::builder("app").section("trainer", trainer).build().unwrap()
    }

    #[test]
    fn test_parse_cli_override() {
        assert_eq!(
            parse_cli_override("trainer.max_epochs=50").unwrap(),
            ("trainer.max_epochs".to_string(), "50".to_string())
        );
        assert_eq!(parse_cli_override("model.name='qtype'").unwrap().1, "qtype");
        assert_eq!(parse_cli_override("a.b=x=y").unwrap().1, "x=y");
    }

    #[test]
    fn test_parse_cli_override_rejects_malformed() {
        for arg in ["trainer.max_epochs", "=5", "a..b=1", "+model.extra=1", "~model.lr"] {
            assert!(
                matches!(parse_cli_override(arg), Err(ConfigError::InvalidOverride { .. })),
                "{arg} should be rejected"
            );
        }
    }

    #[test]
    fn test_cli_overrides_follow_file_overrides() {
        let mut source = OverrideSource::new().with_cli_args(["trainer.max_epochs=3"]).unwrap();
        source.push("trainer.max_epochs", 7, OverrideOrigin::File(PathBuf::from("conf/a.toml")));

        let order: Vec<&OverrideOrigin> = source.in_precedence_order().map(|o| &o.origin).collect();
        assert!(matches!(order[0], OverrideOrigin::File(_)));
        assert_eq!(order[1], &OverrideOrigin::Cli);
    }

    #[test]
    fn test_flatten_descends_into_schema_sections_only() {
        let table: toml::Table = toml::from_str("[trainer]\nmax_epochs = 5\n[unknown]\nx = 1\n").unwrap();
        let table = match Value::from(toml::Value::Table(table)) {
            Value::Section(t) => t,
            _ => unreachable!(),
        };
        let mut source = OverrideSource::new();
        source.extend_from_table(table, &schema(), &OverrideOrigin::Cli);

        let paths: Vec<&str> = source.iter().map(|o| o.path.as_str()).collect();
        assert_eq!(paths, vec!["trainer.max_epochs", "unknown"]);
    }
}
