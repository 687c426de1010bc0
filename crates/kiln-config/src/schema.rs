//! Static schema declarations.
//!
//! A schema is an ordered list of named, typed fields. Nested sections are
//! schemas themselves, so one recursive resolver serves every collaborator
//! without bespoke merge code.

use crate::coerce::coerce_leaf;
use crate::error::{ConfigError, ConfigResult};
use crate::value::{Table, Value};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fmt;

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Bool,
    Integer,
    Float,
    String,
    Path,
    Enum(Vec<String>),
    List(Box<FieldType>),
    Section(Schema),
}

impl FieldType {
    pub fn enumeration<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum(variants.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn list(inner: FieldType) -> Self {
        Self::List(Box::new(inner))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("float"),
            Self::String => f.write_str("string"),
            Self::Path => f.write_str("path"),
            Self::Enum(variants) => write!(f, "enum{{{}}}", variants.join("|")),
            Self::List(inner) => write!(f, "list<{inner}>"),
            Self::Section(schema) => write!(f, "section `{}`", schema.name()),
        }
    }
}

/// How a field obtains its value when no override sets it.
///
/// A single enum makes "required and defaulted" unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    Default(Value),
    /// Defaults to unset.
    Optional,
    Required,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub ty: FieldType,
    pub presence: Presence,
    pub help: Option<String>,
}

impl FieldSpec {
    #[must_use]
    pub fn nested(&self) -> Option<&Schema> {
        match &self.ty {
            FieldType::Section(schema) => Some(schema),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder { name: name.into(), fields: Vec::new(), deferred: None }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fresh deep copy of the defaults. Required and optional fields are absent.
    #[must_use]
    pub fn default_instance(&self) -> Table {
        let mut table = Table::new();
        for field in &self.fields {
            match (&field.ty, &field.presence) {
                (FieldType::Section(nested), _) => {
                    table.insert(field.name.clone(), Value::Section(nested.default_instance()));
                }
                (_, Presence::Default(value)) => {
                    table.insert(field.name.clone(), value.clone());
                }
                (_, Presence::Optional | Presence::Required) => {}
            }
        }
        table
    }

    /// Every leaf field with its dotted path, in declaration order.
    #[must_use]
    pub fn describe(&self) -> Vec<FieldDescription> {
        let mut out = Vec::new();
        self.describe_into("", &mut out);
        out
    }

    fn describe_into(&self, prefix: &str, out: &mut Vec<FieldDescription>) {
        for field in &self.fields {
            let path = join_path(prefix, &field.name);
            if let Some(nested) = field.nested() {
                nested.describe_into(&path, out);
            } else {
                out.push(FieldDescription {
                    path,
                    ty: field.ty.to_string(),
                    presence: field.presence.clone(),
                    help: field.help.clone(),
                });
            }
        }
    }
}

/// Flattened view of a leaf field, used for `config schema` listings.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescription {
    pub path: String,
    pub ty: String,
    pub presence: Presence,
    pub help: Option<String>,
}

impl fmt::Display for FieldDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.ty)?;
        match &self.presence {
            Presence::Default(value) => write!(f, " = {value}")?,
            Presence::Optional => f.write_str(" (optional)")?,
            Presence::Required => f.write_str(" (required)")?,
        }
        if let Some(help) = &self.help {
            write!(f, "  # {help}")?;
        }
        Ok(())
    }
}

pub(crate) fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Collects field declarations; all checks run in [`SchemaBuilder::build`].
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldSpec>,
    deferred: Option<ConfigError>,
}

impl SchemaBuilder {
    #[must_use]
    pub fn field(self, name: &str, ty: FieldType, default: impl Into<Value>) -> Self {
        self.push(name, ty, Presence::Default(default.into()))
    }

    #[must_use]
    pub fn optional(self, name: &str, ty: FieldType) -> Self {
        self.push(name, ty, Presence::Optional)
    }

    #[must_use]
    pub fn required(self, name: &str, ty: FieldType) -> Self {
        self.push(name, ty, Presence::Required)
    }

    #[must_use]
    pub fn section(self, name: &str, schema: Schema) -> Self {
        let defaults = Value::Section(schema.default_instance());
        self.push(name, FieldType::Section(schema), Presence::Default(defaults))
    }

    /// Attach help text to the most recently declared field.
    #[must_use]
    pub fn help(mut self, text: &str) -> Self {
        if let Some(last) = self.fields.last_mut() {
            last.help = Some(text.to_string());
        }
        self
    }

    /// Record a failure raised while producing a nested schema; surfaced by `build`.
    #[must_use]
    pub fn defer_error(mut self, err: ConfigError) -> Self {
        self.deferred.get_or_insert(err);
        self
    }

    fn push(mut self, name: &str, ty: FieldType, presence: Presence) -> Self {
        self.fields.push(FieldSpec { name: name.to_string(), ty, presence, help: None });
        self
    }

    pub fn build(self) -> ConfigResult<Schema> {
        if let Some(err) = self.deferred {
            return Err(err);
        }

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(self.fields.len());
        for mut field in self.fields {
            if field.name.is_empty() || field.name.contains('.') || field.name.contains(char::is_whitespace) {
                return Err(ConfigError::schema(&self.name, format!("invalid field name `{}`", field.name)));
            }
            if !seen.insert(field.name.clone()) {
                return Err(ConfigError::schema(&self.name, format!("duplicate field `{}`", field.name)));
            }
            check_type(&self.name, &field.name, &field.ty)?;

            if let (Presence::Default(value), false) = (&field.presence, matches!(field.ty, FieldType::Section(_))) {
                let path = format!("{}.{}", self.name, field.name);
                let normalized = coerce_leaf(value.clone(), &field.ty, &path).map_err(|err| {
                    ConfigError::schema(&self.name, format!("default for `{}` is invalid: {err}", field.name))
                })?;
                field.presence = Presence::Default(normalized);
            }
            fields.push(field);
        }

        Ok(Schema { name: self.name, fields })
    }
}

fn check_type(schema: &str, field: &str, ty: &FieldType) -> ConfigResult<()> {
    match ty {
        FieldType::Enum(variants) if variants.is_empty() => {
            Err(ConfigError::schema(schema, format!("enum field `{field}` declares no variants")))
        }
        FieldType::List(inner) if matches!(**inner, FieldType::Section(_)) => {
            Err(ConfigError::schema(schema, format!("list field `{field}` cannot hold sections")))
        }
        FieldType::List(inner) => check_type(schema, field, inner),
        _ => Ok(()),
    }
}

/// A configuration section contributed by a collaborator.
///
/// The schema declares what the resolver accepts; the type itself is what
/// the collaborator's constructor receives once the section is resolved.
pub trait ConfigSection: DeserializeOwned {
    fn schema() -> ConfigResult<Schema>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trainer_schema() -> Schema {
        Schema::builder("trainer")
            .field("max_epochs", FieldType::Integer, 10)
            .help("epochs to run")
            .optional("max_steps", FieldType::Integer)
            .field("clip", FieldType::Float, 1)
            .build()
            .unwrap()
    }

    #[test]
    fn test_default_instance_skips_unset_fields() {
        let defaults = trainer_schema().default_instance();
        assert_eq!(defaults.get("max_epochs"), Some(&Value::Integer(10)));
        assert!(!defaults.contains_key("max_steps"));
    }

    #[test]
    fn test_defaults_are_normalized_to_declared_type() {
        let defaults = trainer_schema().default_instance();
        assert_eq!(defaults.get("clip"), Some(&Value::Float(1.0)));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = Schema::builder("optim")
            .field("lr", FieldType::Float, 0.1)
            .field("lr", FieldType::Float, 0.2)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::SchemaDefinition { .. }));
        assert!(err.to_string().contains("duplicate field `lr`"));
    }

    #[test]
    fn test_ill_typed_default_rejected() {
        let err = Schema::builder("trainer").field("max_epochs", FieldType::Integer, "ten").build().unwrap_err();
        assert!(matches!(err, ConfigError::SchemaDefinition { .. }));
    }

    #[test]
    fn test_enum_default_must_be_a_variant() {
        let err = Schema::builder("optim")
            .field("name", FieldType::enumeration(["adam", "sgd"]), "lion")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("name"));

        let err = Schema::builder("optim")
            .field("name", FieldType::Enum(vec![]), "adam")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("no variants"));
    }

    #[test]
    fn test_malformed_field_names_rejected() {
        for name in ["a.b", "", "max epochs", "lr\t"] {
            let err = Schema::builder("s").field(name, FieldType::Bool, true).build().unwrap_err();
            assert!(matches!(err, ConfigError::SchemaDefinition { .. }), "{name:?}");
            assert!(err.to_string().contains("invalid field name"), "{name:?}");
        }
    }

    #[test]
    fn test_nested_section_defaults_and_description() {
        let root = Schema::builder("app").section("trainer", trainer_schema()).build().unwrap();
        let defaults = root.default_instance();
        let trainer = defaults.get("trainer").and_then(Value::as_section).unwrap();
        assert_eq!(trainer.get("max_epochs"), Some(&Value::Integer(10)));

        let lines: Vec<String> = root.describe().iter().map(ToString::to_string).collect();
        assert_eq!(lines[0], "trainer.max_epochs: integer = 10  # epochs to run");
        assert_eq!(lines[1], "trainer.max_steps: integer (optional)");
    }

    #[test]
    fn test_default_instance_is_a_deep_copy() {
        let root = Schema::builder("app").section("trainer", trainer_schema()).build().unwrap();
        let mut first = root.default_instance();
        if let Some(Value::Section(t)) = first.get_mut("trainer") {
            t.insert("max_epochs".to_string(), Value::Integer(99));
        }
        let second = root.default_instance();
        assert_eq!(second.get("trainer").and_then(|t| t.lookup("max_epochs")), Some(&Value::Integer(10)));
    }
}
