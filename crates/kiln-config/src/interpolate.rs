//! `${...}` references between configuration values.
//!
//! - `${a.b}` as the whole string takes the referenced value and its type.
//! - `${a.b}` inside text is replaced by the scalar's rendering.
//! - `${env:NAME}` and `${env:NAME,default}` read the environment.

use crate::error::{ConfigError, ConfigResult};
use crate::schema::join_path;
use crate::value::{lookup, Table, Value};

enum Token<'a> {
    Text(&'a str),
    Ref(&'a str),
}

fn tokenize<'a>(path: &str, raw: &'a str) -> ConfigResult<Vec<Token<'a>>> {
    let mut tokens = Vec::new();
    let mut rest = raw;
    while let Some(start) = rest.find("${") {
        if start > 0 {
            tokens.push(Token::Text(&rest[..start]));
        }
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| ConfigError::interpolation(path, format!("unterminated reference in {raw:?}")))?;
        tokens.push(Token::Ref(after[..end].trim()));
        rest = &after[end + 1..];
    }
    if !rest.is_empty() {
        tokens.push(Token::Text(rest));
    }
    Ok(tokens)
}

struct Interpolator<'a> {
    root: &'a Table,
    env: &'a dyn Fn(&str) -> Option<String>,
    active: Vec<String>,
}

impl Interpolator<'_> {
    fn resolve(&mut self, path: &str, value: &Value) -> ConfigResult<Value> {
        match value {
            Value::String(s) if s.contains("${") => self.resolve_string(path, s),
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| self.resolve(&format!("{path}[{idx}]"), item))
                .collect::<ConfigResult<Vec<_>>>()
                .map(Value::List),
            Value::Section(table) => {
                let mut out = Table::new();
                for (key, item) in table {
                    out.insert(key.clone(), self.resolve(&join_path(path, key), item)?);
                }
                Ok(Value::Section(out))
            }
            other => Ok(other.clone()),
        }
    }

    fn resolve_string(&mut self, path: &str, raw: &str) -> ConfigResult<Value> {
        let tokens = tokenize(path, raw)?;
        if let [Token::Ref(expr)] = tokens.as_slice() {
            return self.lookup(path, expr);
        }

        let mut out = String::new();
        for token in tokens {
            match token {
                Token::Text(text) => out.push_str(text),
                Token::Ref(expr) => {
                    let value = self.lookup(path, expr)?;
                    let rendered = value.render_scalar().ok_or_else(|| {
                        ConfigError::interpolation(
                            path,
                            format!("`${{{expr}}}` is a {} and cannot be embedded in text", value.type_name()),
                        )
                    })?;
                    out.push_str(&rendered);
                }
            }
        }
        Ok(Value::String(out))
    }

    fn lookup(&mut self, path: &str, expr: &str) -> ConfigResult<Value> {
        if let Some(spec) = expr.strip_prefix("env:") {
            let (name, default) = match spec.split_once(',') {
                Some((name, default)) => (name.trim(), Some(default.trim())),
                None => (spec.trim(), None),
            };
            return (self.env)(name)
                .or_else(|| default.map(str::to_string))
                .map(Value::String)
                .ok_or_else(|| ConfigError::interpolation(path, format!("environment variable `{name}` is not set")));
        }

        if self.active.iter().any(|p| p == expr) {
            let mut chain = self.active.clone();
            chain.push(expr.to_string());
            return Err(ConfigError::interpolation(path, format!("reference cycle: {}", chain.join(" -> "))));
        }

        let target = lookup(self.root, expr)
            .ok_or_else(|| ConfigError::interpolation(path, format!("`{expr}` does not resolve to a value")))?;
        if target.is_missing_marker() {
            return Err(ConfigError::missing(expr));
        }

        self.active.push(expr.to_string());
        let resolved = self.resolve(expr, target);
        self.active.pop();
        resolved
    }
}

/// Replace every reference in `root`, reading targets from its state before
/// any replacement.
pub(crate) fn resolve_interpolations(root: &mut Table, env: &dyn Fn(&str) -> Option<String>) -> ConfigResult<()> {
    if !root.values().any(Value::has_interpolation) {
        return Ok(());
    }

    let snapshot = root.clone();
    let mut interpolator = Interpolator { root: &snapshot, env, active: Vec::new() };
    for (key, value) in root.iter_mut() {
        if value.has_interpolation() {
            interpolator.active = vec![key.clone()];
            *value = interpolator.resolve(key, value)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn table(src: &str) -> Table {
        let parsed: toml::Table = toml::from_str(src).unwrap();
        match Value::from(toml::Value::Table(parsed)) {
            Value::Section(t) => t,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_whole_reference_keeps_type() {
        let mut root = table("[loader]\nbatch_size = 32\n[model]\nbatch = \"${loader.batch_size}\"\n");
        resolve_interpolations(&mut root, &no_env).unwrap();
        assert_eq!(lookup(&root, "model.batch"), Some(&Value::Integer(32)));
    }

    #[test]
    fn test_embedded_reference_renders_text() {
        let mut root = table("name = \"qtype\"\nversion = 2\n[trainer]\ndir = \"runs/${name}/v${version}\"\n");
        resolve_interpolations(&mut root, &no_env).unwrap();
        assert_eq!(lookup(&root, "trainer.dir"), Some(&Value::from("runs/qtype/v2")));

        let mut root = table("[trainer]\ndir = \"runs/${absent}\"\n");
        let err = resolve_interpolations(&mut root, &no_env).unwrap_err();
        assert!(err.to_string().contains("trainer.dir"));
    }

    #[test]
    fn test_chained_references() {
        let mut root = table("a = \"${b}\"\nb = \"${c}\"\nc = 1.5\n");
        resolve_interpolations(&mut root, &no_env).unwrap();
        assert_eq!(root.get("a"), Some(&Value::Float(1.5)));
    }

    #[test]
    fn test_cycle_detected() {
        let mut root = table("a = \"${b}\"\nb = \"${a}\"\n");
        let err = resolve_interpolations(&mut root, &no_env).unwrap_err();
        assert!(err.to_string().contains("reference cycle"));
    }

    #[test]
    fn test_env_reference_with_default() {
        let env = |name: &str| (name == "DATA_ROOT").then(|| "/data".to_string());
        let mut root = table("path = \"${env:DATA_ROOT}/clevr\"\nother = \"${env:UNSET_VAR, fallback}\"\n");
        resolve_interpolations(&mut root, &env).unwrap();
        assert_eq!(root.get("path"), Some(&Value::from("/data/clevr")));
        assert_eq!(root.get("other"), Some(&Value::from("fallback")));

        let mut root = table("path = \"${env:UNSET_VAR}\"\n");
        assert!(matches!(resolve_interpolations(&mut root, &env), Err(ConfigError::Interpolation { .. })));
    }

    #[test]
    fn test_section_cannot_be_embedded() {
        let mut root = table("x = \"v=${s}\"\n[s]\na = 1\n");
        let err = resolve_interpolations(&mut root, &no_env).unwrap_err();
        assert!(err.to_string().contains("section"));
    }

    #[test]
    fn test_unterminated_reference() {
        let mut root = table("x = \"${oops\"\n");
        assert!(resolve_interpolations(&mut root, &no_env).is_err());
    }
}
