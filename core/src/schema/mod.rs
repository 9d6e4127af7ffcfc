//! Turns explicit tool signatures into capability descriptors.
//!
//! A tool declares its parameters with a [`Signature`]: each parameter has a
//! name, a type annotation taken from a small table of aliases, and
//! optionally a default. [`describe`] validates the declaration and produces
//! a [`CapabilityDescriptor`], which renders to the JSON schema the
//! completion service expects.

pub mod arguments;

pub use arguments::Arguments;

use crate::error::SchemaError;
use crate::traits::ToolSpec;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParamType {
    pub fn from_annotation(annotation: &str) -> Option<Self> {
        match annotation.trim().to_ascii_lowercase().as_str() {
            "str" | "string" => Some(Self::String),
            "int" | "integer" => Some(Self::Integer),
            "float" | "number" => Some(Self::Number),
            "bool" | "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }

    /// Strict check used for declared defaults; no coercion.
    fn admits(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: String,
    pub annotation: Option<String>,
    pub default: Option<Value>,
}

/// Declared shape of a callable tool.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    name: String,
    doc: Option<String>,
    params: Vec<ParamDecl>,
}

impl Signature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            params: Vec::new(),
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Required parameter.
    pub fn param(mut self, name: impl Into<String>, annotation: impl Into<String>) -> Self {
        self.params.push(ParamDecl {
            name: name.into(),
            annotation: Some(annotation.into()),
            default: None,
        });
        self
    }

    /// Optional parameter, filled with `default` when the model omits it.
    pub fn optional(
        mut self,
        name: impl Into<String>,
        annotation: impl Into<String>,
        default: impl Into<Value>,
    ) -> Self {
        self.params.push(ParamDecl {
            name: name.into(),
            annotation: Some(annotation.into()),
            default: Some(default.into()),
        });
        self
    }

    /// Parameter without a type annotation. Such a signature never
    /// describes successfully.
    pub fn untyped(mut self, name: impl Into<String>) -> Self {
        self.params.push(ParamDecl {
            name: name.into(),
            annotation: None,
            default: None,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamDecl] {
        &self.params
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ParamType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Immutable description of one tool, derived once at registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilityDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
}

impl CapabilityDescriptor {
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
    }

    pub fn to_json_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        for param in &self.parameters {
            let mut property = json!({ "type": param.ty.as_str() });
            if let Some(default) = &param.default {
                property["default"] = default.clone();
            }
            properties.insert(param.name.clone(), property);
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required().collect::<Vec<_>>(),
        })
    }

    pub fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.to_json_schema(),
        }
    }
}

pub fn describe(signature: &Signature) -> Result<CapabilityDescriptor, SchemaError> {
    let tool = signature.name.trim();
    if tool.is_empty() {
        return Err(SchemaError::EmptyName);
    }

    let mut seen = HashSet::new();
    let mut parameters = Vec::with_capacity(signature.params.len());

    for decl in &signature.params {
        if !seen.insert(decl.name.as_str()) {
            return Err(SchemaError::DuplicateParameter {
                tool: tool.to_string(),
                param: decl.name.clone(),
            });
        }

        let annotation =
            decl.annotation
                .as_deref()
                .ok_or_else(|| SchemaError::MissingAnnotation {
                    tool: tool.to_string(),
                    param: decl.name.clone(),
                })?;

        let ty =
            ParamType::from_annotation(annotation).ok_or_else(|| SchemaError::UnsupportedType {
                tool: tool.to_string(),
                param: decl.name.clone(),
                annotation: annotation.to_string(),
            })?;

        if let Some(default) = &decl.default
            && !ty.admits(default)
        {
            return Err(SchemaError::InvalidDefault {
                tool: tool.to_string(),
                param: decl.name.clone(),
                expected: ty.as_str(),
            });
        }

        parameters.push(ParameterSpec {
            name: decl.name.clone(),
            ty,
            required: decl.default.is_none(),
            default: decl.default.clone(),
        });
    }

    Ok(CapabilityDescriptor {
        name: tool.to_string(),
        description: signature
            .doc
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bmi_signature() -> Signature {
        Signature::new("calculate_bmi")
            .doc("Calculate BMI given weight in kg and height in meters")
            .param("weight_kg", "float")
            .param("height_m", "float")
    }

    #[test]
    fn required_set_is_params_without_defaults() {
        let sig = Signature::new("search")
            .param("query", "str")
            .optional("limit", "int", 3)
            .param("exact", "bool")
            .optional("lang", "string", "en");

        let descriptor = describe(&sig).unwrap();
        let required: Vec<_> = descriptor.required().collect();
        assert_eq!(required, vec!["query", "exact"]);
        assert_eq!(
            descriptor.parameter("limit").unwrap().default,
            Some(json!(3))
        );
    }

    #[test]
    fn aliases_map_to_semantic_types() {
        let sig = Signature::new("t")
            .param("a", "str")
            .param("b", "int")
            .param("c", "float")
            .param("d", "bool")
            .param("e", "Number");

        let types: Vec<_> = describe(&sig)
            .unwrap()
            .parameters
            .iter()
            .map(|p| p.ty)
            .collect();
        assert_eq!(
            types,
            vec![
                ParamType::String,
                ParamType::Integer,
                ParamType::Number,
                ParamType::Boolean,
                ParamType::Number,
            ]
        );
    }

    #[test]
    fn untyped_parameter_is_rejected() {
        let sig = Signature::new("echo").untyped("message");
        assert_eq!(
            describe(&sig),
            Err(SchemaError::MissingAnnotation {
                tool: "echo".into(),
                param: "message".into(),
            })
        );
    }

    #[test]
    fn unsupported_type_is_rejected() {
        let sig = Signature::new("sum").param("values", "list");
        assert!(matches!(
            describe(&sig),
            Err(SchemaError::UnsupportedType { annotation, .. }) if annotation == "list"
        ));
    }

    #[test]
    fn default_must_match_type() {
        let sig = Signature::new("t").optional("n", "int", "three");
        assert!(matches!(
            describe(&sig),
            Err(SchemaError::InvalidDefault { expected: "integer", .. })
        ));

        let sig = Signature::new("t").optional("x", "number", 2);
        assert!(describe(&sig).is_ok());
    }

    #[test]
    fn duplicate_and_empty_names_are_rejected() {
        let sig = Signature::new("t").param("a", "int").param("a", "str");
        assert!(matches!(
            describe(&sig),
            Err(SchemaError::DuplicateParameter { .. })
        ));
        assert_eq!(
            describe(&Signature::new("  ")),
            Err(SchemaError::EmptyName)
        );
    }

    #[test]
    fn missing_doc_gives_empty_description() {
        let descriptor = describe(&Signature::new("ping")).unwrap();
        assert_eq!(descriptor.description, "");
        assert!(descriptor.parameters.is_empty());
    }

    #[test]
    fn schema_output_is_deterministic() {
        let first = serde_json::to_string(&describe(&bmi_signature()).unwrap().spec()).unwrap();
        for _ in 0..5 {
            let again =
                serde_json::to_string(&describe(&bmi_signature()).unwrap().spec()).unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn json_schema_shape() {
        let descriptor = describe(
            &Signature::new("get_current_datetime")
                .doc("  Current local date and time  ")
                .optional("format", "str", "%Y-%m-%d"),
        )
        .unwrap();

        assert_eq!(descriptor.description, "Current local date and time");
        assert_eq!(
            descriptor.to_json_schema(),
            json!({
                "type": "object",
                "properties": {
                    "format": { "type": "string", "default": "%Y-%m-%d" }
                },
                "required": []
            })
        );
    }

    #[test]
    fn properties_keep_declaration_order() {
        let descriptor = describe(
            &Signature::new("sort")
                .param("zeta", "str")
                .param("alpha", "int")
                .optional("mid", "bool", false),
        )
        .unwrap();

        let schema = descriptor.to_json_schema();
        let keys: Vec<_> = schema["properties"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);

        let rendered = serde_json::to_string(&schema).unwrap();
        assert!(rendered.find("\"zeta\"").unwrap() < rendered.find("\"alpha\"").unwrap());
    }
}
