//! Leaf coercion: raw or loosely typed values to a field's declared type.

use crate::error::{ConfigError, ConfigResult};
use crate::schema::FieldType;
use crate::value::{Table, Value};

/// Coerce a non-section value. Sections are handled by the resolver, which
/// needs the nested schema to rebuild the subtree.
pub(crate) fn coerce_leaf(value: Value, ty: &FieldType, path: &str) -> ConfigResult<Value> {
    let coerced = match ty {
        FieldType::Bool => match &value {
            Value::Bool(b) => Some(Value::Bool(*b)),
            Value::String(s) => parse_bool(s).map(Value::Bool),
            _ => None,
        },
        FieldType::Integer => match &value {
            Value::Integer(i) => Some(Value::Integer(*i)),
            Value::String(s) => s.trim().parse::<i64>().ok().map(Value::Integer),
            _ => None,
        },
        FieldType::Float => match &value {
            Value::Float(f) => Some(Value::Float(*f)),
            Value::Integer(i) => Some(Value::Float(*i as f64)),
            Value::String(s) => s.trim().parse::<f64>().ok().map(Value::Float),
            _ => None,
        },
        FieldType::String | FieldType::Path => match &value {
            Value::String(s) => Some(Value::String(s.clone())),
            Value::Bool(_) | Value::Integer(_) | Value::Float(_) => value.render_scalar().map(Value::String),
            _ => None,
        },
        FieldType::Enum(variants) => match &value {
            Value::String(s) => variants.iter().find(|v| *v == s).map(|v| Value::String(v.clone())),
            _ => None,
        },
        FieldType::List(inner) => {
            let items = match &value {
                Value::List(items) => Some(items.clone()),
                Value::String(s) => parse_inline_list(s),
                _ => None,
            };
            if let Some(items) = items {
                let coerced = items
                    .into_iter()
                    .enumerate()
                    .map(|(idx, item)| coerce_leaf(item, inner, &format!("{path}[{idx}]")))
                    .collect::<ConfigResult<Vec<_>>>()?;
                Some(Value::List(coerced))
            } else {
                None
            }
        }
        FieldType::Section(_) => None,
    };

    coerced.ok_or_else(|| mismatch(path, ty, &value))
}

pub(crate) fn mismatch(path: &str, ty: &FieldType, value: &Value) -> ConfigError {
    ConfigError::TypeMismatch {
        path: path.to_string(),
        expected: ty.to_string(),
        received: value.describe(),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Parse `raw` as the right-hand side of a TOML assignment.
fn parse_inline(raw: &str) -> Option<Value> {
    let doc: toml::Table = toml::from_str(&format!("v = {raw}")).ok()?;
    doc.get("v").cloned().map(Value::from)
}

/// `[1, 2]` parses as TOML; `[a, b]` falls back to comma splitting so bare
/// words work on the command line.
fn parse_inline_list(raw: &str) -> Option<Vec<Value>> {
    let trimmed = raw.trim();
    if let Some(Value::List(items)) = parse_inline(trimmed) {
        return Some(items);
    }
    let inner = trimmed.strip_prefix('[')?.strip_suffix(']')?;
    Some(
        inner
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| Value::String(item.to_string()))
            .collect(),
    )
}

/// `{a = 1, b = "x"}` as a table.
pub(crate) fn parse_inline_table(raw: &str) -> Option<Table> {
    match parse_inline(raw.trim()) {
        Some(Value::Section(table)) => Some(table),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coerce(value: impl Into<Value>, ty: &FieldType) -> ConfigResult<Value> {
        coerce_leaf(value.into(), ty, "x")
    }

    #[test]
    fn test_integer_from_string() {
        assert_eq!(coerce("50", &FieldType::Integer).unwrap(), Value::Integer(50));
        assert!(matches!(coerce("fifty", &FieldType::Integer), Err(ConfigError::TypeMismatch { .. })));
        assert!(matches!(coerce(1.5, &FieldType::Integer), Err(ConfigError::TypeMismatch { .. })));
    }

    #[test]
    fn test_float_accepts_integers() {
        assert_eq!(coerce(3, &FieldType::Float).unwrap(), Value::Float(3.0));
        assert_eq!(coerce("0.01", &FieldType::Float).unwrap(), Value::Float(0.01));
    }

    #[test]
    fn test_bool_spellings() {
        assert_eq!(coerce("yes", &FieldType::Bool).unwrap(), Value::Bool(true));
        assert_eq!(coerce("OFF", &FieldType::Bool).unwrap(), Value::Bool(false));
        assert!(coerce("maybe", &FieldType::Bool).is_err());
    }

    #[test]
    fn test_enum_requires_exact_variant() {
        let ty = FieldType::enumeration(["adam", "sgd"]);
        assert_eq!(coerce("sgd", &ty).unwrap(), Value::from("sgd"));
        let err = coerce("rmsprop", &ty).unwrap_err();
        assert!(err.to_string().contains("adam|sgd"));
    }

    #[test]
    fn test_list_from_cli_strings() {
        let floats = FieldType::list(FieldType::Float);
        assert_eq!(coerce("[0.9, 0.99]", &floats).unwrap(), Value::from(vec![0.9, 0.99]));

        let words = FieldType::list(FieldType::String);
        assert_eq!(coerce("[count, exist]", &words).unwrap(), Value::from(vec!["count", "exist"]));
        assert_eq!(coerce("[]", &words).unwrap(), Value::List(vec![]));
    }

    #[test]
    fn test_list_element_mismatch_names_index() {
        let ints = FieldType::list(FieldType::Integer);
        let err = coerce("[1, x]", &ints).unwrap_err();
        assert!(err.to_string().contains("x[1]"));
    }

    #[test]
    fn test_inline_table() {
        let table = parse_inline_table("{ lr = 0.1, name = \"sgd\" }").unwrap();
        assert_eq!(table.get("lr"), Some(&Value::Float(0.1)));
        assert!(parse_inline_table("0.1").is_none());
    }
}
