//! Root schema assembly from collaborator-contributed sections.

use crate::error::ConfigResult;
use crate::schema::{ConfigSection, FieldType, Schema, SchemaBuilder};
use crate::value::Value;

/// Builds the root schema of an application.
///
/// Sections are registered by type; a collaborator whose own schema fails
/// to build poisons the registry, so `build` reports the first failure
/// before any configuration is read.
#[derive(Debug)]
pub struct SchemaRegistry {
    builder: SchemaBuilder,
}

impl SchemaRegistry {
    pub fn new(app: impl Into<String>) -> Self {
        Self { builder: Schema::builder(app) }
    }

    #[must_use]
    pub fn register<T: ConfigSection>(self, section: &str) -> Self {
        match T::schema() {
            Ok(schema) => self.register_schema(section, schema),
            Err(err) => Self { builder: self.builder.defer_error(err) },
        }
    }

    #[must_use]
    pub fn register_schema(self, section: &str, schema: Schema) -> Self {
        Self { builder: self.builder.section(section, schema) }
    }

    /// Root-level primitive setting.
    #[must_use]
    pub fn setting(self, name: &str, ty: FieldType, default: impl Into<Value>) -> Self {
        Self { builder: self.builder.field(name, ty, default) }
    }

    pub fn build(self) -> ConfigResult<Schema> {
        let schema = self.builder.build()?;
        tracing::debug!(schema = schema.name(), sections = schema.fields().len(), "schema registered");
        Ok(schema)
    }
}
