//! `${VAR}` substitution in config string values.
//!
//! Only uppercase `[A-Z_][A-Z0-9_]*` names are recognized. `$${VAR}` is an
//! escape and becomes the literal text `${VAR}`. A reference to a missing or
//! empty variable is an error naming the variable and where it was used.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

// Group 1 is the escaping `$`, group 2 the variable name.
static ENV_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(\$)?\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute references using the process environment.
pub fn substitute_env_vars(value: &Value) -> Result<Value, MissingEnvVarError> {
    substitute_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute references using `env` (tests pass their own map).
pub fn substitute_env_vars_with(
    value: &Value,
    env: &HashMap<String, String>,
) -> Result<Value, MissingEnvVarError> {
    walk(value, env, "")
}

fn walk(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value, MissingEnvVarError> {
    Ok(match value {
        Value::String(s) => Value::String(substitute_str(s, env, path)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| walk(item, env, &format!("{path}[{i}]")))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                out.insert(key.clone(), walk(child, env, &child_path)?);
            }
            Value::Object(out)
        }
        other => other.clone(),
    })
}

fn substitute_str(
    s: &str,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<String, MissingEnvVarError> {
    if !s.contains("${") {
        return Ok(s.to_string());
    }

    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for caps in ENV_REF.captures_iter(s) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&s[last..whole.start()]);
        let name = &caps[2];
        if caps.get(1).is_some() {
            out.push_str("${");
            out.push_str(name);
            out.push('}');
        } else {
            match env.get(name).filter(|v| !v.is_empty()) {
                Some(val) => out.push_str(val),
                None => {
                    return Err(MissingEnvVarError {
                        var_name: name.to_string(),
                        config_path: path.to_string(),
                    })
                }
            }
        }
        last = whole.end();
    }
    out.push_str(&s[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_inside_nested_values() {
        let value = json!({"ocr": {"binary": "${TESS_HOME}/bin/tesseract"}, "tags": ["${ZONE}"]});
        let env = env(&[("TESS_HOME", "/opt/tess"), ("ZONE", "UTC")]);
        let out = substitute_env_vars_with(&value, &env).unwrap();
        assert_eq!(out["ocr"]["binary"], "/opt/tess/bin/tesseract");
        assert_eq!(out["tags"][0], "UTC");
    }

    #[test]
    fn missing_var_names_the_path() {
        let value = json!({"server": {"bind": "${MEDIBOOK_HOST}"}});
        let err = substitute_env_vars_with(&value, &HashMap::new()).unwrap_err();
        assert_eq!(err.var_name, "MEDIBOOK_HOST");
        assert_eq!(err.config_path, "server.bind");
    }

    #[test]
    fn empty_var_counts_as_missing() {
        let value = json!({"level": "${LOG_LEVEL}"});
        assert!(substitute_env_vars_with(&value, &env(&[("LOG_LEVEL", "")])).is_err());
    }

    #[test]
    fn escaped_reference_is_kept_literally() {
        let value = json!({"note": "cost $${NOT_A_VAR} each"});
        let out = substitute_env_vars_with(&value, &HashMap::new()).unwrap();
        assert_eq!(out["note"], "cost ${NOT_A_VAR} each");
    }

    #[test]
    fn non_strings_pass_through() {
        let value = json!({"port": 3000, "pinned": null, "ok": true});
        assert_eq!(substitute_env_vars_with(&value, &HashMap::new()).unwrap(), value);
    }
}
