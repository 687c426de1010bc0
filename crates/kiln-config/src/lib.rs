//! Kiln Config
//!
//! Schema-driven configuration resolution:
//! - Declaring typed schemas (`Schema`, `SchemaRegistry`, `ConfigSection`)
//! - Collecting file and command-line overrides (`OverrideSource`)
//! - Merging, interpolating and validating into a `ResolvedConfig`

mod coerce;
pub mod error;
mod interpolate;
pub mod overrides;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod source;
pub mod value;

pub use error::{ConfigError, ConfigResult};
pub use overrides::{parse_cli_override, Override, OverrideOrigin, OverrideSource};
pub use registry::SchemaRegistry;
pub use resolver::{resolve, resolve_with_env, ResolvedConfig};
pub use schema::{ConfigSection, FieldDescription, FieldSpec, FieldType, Presence, Schema, SchemaBuilder};
pub use source::{load_config_file, locate_config, CONFIG_EXTENSIONS, DEFAULT_CONFIG_DIR};
pub use value::{Table, Value, MISSING};
