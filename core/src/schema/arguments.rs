use super::{CapabilityDescriptor, ParamType};
use crate::error::ToolError;
use serde_json::{Map, Number, Value};

/// Arguments for one tool call, coerced to the declared parameter types
/// with defaults filled in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    tool: String,
    values: Map<String, Value>,
}

impl Arguments {
    /// Parses the raw JSON text the model sent and coerces each declared
    /// parameter. Keys the descriptor does not declare are dropped.
    pub fn coerce(descriptor: &CapabilityDescriptor, raw: &str) -> Result<Self, ToolError> {
        let invalid = |reason: String| ToolError::InvalidArguments {
            tool: descriptor.name.clone(),
            reason,
        };

        let raw = raw.trim();
        let mut incoming = if raw.is_empty() {
            Map::new()
        } else {
            match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                Ok(Value::Null) => Map::new(),
                Ok(other) => {
                    return Err(invalid(format!(
                        "expected a JSON object, got {}",
                        json_kind(&other)
                    )));
                }
                Err(e) => return Err(invalid(format!("arguments are not valid JSON: {}", e))),
            }
        };

        let mut values = Map::new();
        for param in &descriptor.parameters {
            match incoming.remove(&param.name) {
                Some(Value::Null) | None => {
                    if let Some(default) = &param.default {
                        values.insert(param.name.clone(), default.clone());
                    } else {
                        return Err(invalid(format!(
                            "missing required parameter '{}'",
                            param.name
                        )));
                    }
                }
                Some(value) => {
                    let coerced = coerce_value(param.ty, value).map_err(|got| {
                        invalid(format!(
                            "parameter '{}' expects {}, got {}",
                            param.name, param.ty, got
                        ))
                    })?;
                    values.insert(param.name.clone(), coerced);
                }
            }
        }

        if !incoming.is_empty() {
            tracing::debug!(
                tool = %descriptor.name,
                ignored = ?incoming.keys().collect::<Vec<_>>(),
                "Dropping undeclared arguments"
            );
        }

        Ok(Self {
            tool: descriptor.name.clone(),
            values,
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn str(&self, key: &str) -> Result<&str, ToolError> {
        self.get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| self.missing(key, "string"))
    }

    pub fn i64(&self, key: &str) -> Result<i64, ToolError> {
        self.get(key)
            .and_then(Value::as_i64)
            .ok_or_else(|| self.missing(key, "integer"))
    }

    pub fn f64(&self, key: &str) -> Result<f64, ToolError> {
        self.get(key)
            .and_then(Value::as_f64)
            .ok_or_else(|| self.missing(key, "number"))
    }

    pub fn bool(&self, key: &str) -> Result<bool, ToolError> {
        self.get(key)
            .and_then(Value::as_bool)
            .ok_or_else(|| self.missing(key, "boolean"))
    }

    pub fn str_opt(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn i64_opt(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }

    fn missing(&self, key: &str, expected: &str) -> ToolError {
        ToolError::InvalidArguments {
            tool: self.tool.clone(),
            reason: format!("no {} argument named '{}'", expected, key),
        }
    }
}

fn coerce_value(ty: ParamType, value: Value) -> Result<Value, &'static str> {
    match (ty, value) {
        (ParamType::String, Value::String(s)) => Ok(Value::String(s)),
        (ParamType::String, v @ (Value::Number(_) | Value::Bool(_))) => {
            Ok(Value::String(v.to_string()))
        }

        (ParamType::Integer, Value::Number(n)) => {
            if n.is_i64() || n.is_u64() {
                Ok(Value::Number(n))
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        Ok(Value::from(f as i64))
                    }
                    _ => Err("a non-integral number"),
                }
            }
        }
        (ParamType::Integer, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| "a non-numeric string"),

        (ParamType::Number, Value::Number(n)) => Ok(Value::Number(n)),
        (ParamType::Number, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or("a non-numeric string"),

        (ParamType::Boolean, Value::Bool(b)) => Ok(Value::Bool(b)),
        (ParamType::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err("a non-boolean string"),
        },

        (_, other) => Err(json_kind(&other)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Signature, describe};
    use serde_json::json;

    fn descriptor() -> CapabilityDescriptor {
        describe(
            &Signature::new("probe")
                .param("name", "str")
                .param("count", "int")
                .param("ratio", "float")
                .optional("verbose", "bool", false),
        )
        .unwrap()
    }

    #[test]
    fn coerces_loose_model_output() {
        let args = Arguments::coerce(
            &descriptor(),
            r#"{"name": 42, "count": "7", "ratio": "0.5", "verbose": "TRUE"}"#,
        )
        .unwrap();

        assert_eq!(args.str("name").unwrap(), "42");
        assert_eq!(args.i64("count").unwrap(), 7);
        assert_eq!(args.f64("ratio").unwrap(), 0.5);
        assert!(args.bool("verbose").unwrap());
    }

    #[test]
    fn integral_float_becomes_integer() {
        let args =
            Arguments::coerce(&descriptor(), r#"{"name": "a", "count": 3.0, "ratio": 1}"#).unwrap();
        assert_eq!(args.get("count"), Some(&json!(3)));
        assert_eq!(args.f64("ratio").unwrap(), 1.0);
    }

    #[test]
    fn fills_defaults_and_drops_unknown_keys() {
        let args = Arguments::coerce(
            &descriptor(),
            r#"{"name": "a", "count": 1, "ratio": 2.5, "extra": true}"#,
        )
        .unwrap();
        assert!(!args.bool("verbose").unwrap());
        assert!(args.get("extra").is_none());
    }

    #[test]
    fn missing_required_parameter_fails() {
        let err = Arguments::coerce(&descriptor(), r#"{"name": "a"}"#).unwrap_err();
        assert!(err.to_string().contains("missing required parameter 'count'"));
    }

    #[test]
    fn rejects_wrong_shapes() {
        let err =
            Arguments::coerce(&descriptor(), r#"{"name": "a", "count": 1.5, "ratio": 1}"#)
                .unwrap_err();
        assert!(err.to_string().contains("expects integer"));

        let err = Arguments::coerce(&descriptor(), "[1, 2]").unwrap_err();
        assert!(err.to_string().contains("expected a JSON object"));

        let err = Arguments::coerce(&descriptor(), "{not json").unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn empty_arguments_for_parameterless_tool() {
        let descriptor = describe(&Signature::new("now")).unwrap();
        assert!(Arguments::coerce(&descriptor, "").is_ok());
        assert!(Arguments::coerce(&descriptor, "{}").is_ok());
        assert!(Arguments::coerce(&descriptor, "null").is_ok());
    }
}
