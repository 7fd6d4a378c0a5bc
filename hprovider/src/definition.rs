//! Tool definitions and their function-calling wire export.
//!
//! ```rust
//! use hprovider::ToolDefinition;
//!
//! let definition = ToolDefinition::new("amap_weather", "Live weather for a district")
//!     .with_parameter("location", "string", "District name, e.g. 海淀区", true)
//!     .with_parameter("unit", "string", "Temperature unit", false);
//!
//! let wire = definition.to_wire();
//! assert_eq!(wire["type"], "function");
//! assert_eq!(wire["function"]["parameters"]["required"][0], "location");
//!
//! let reimported = ToolDefinition::from_wire(&wire).expect("export should re-import");
//! assert_eq!(reimported, definition);
//! ```

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::ProviderError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub param_type: String,
    pub description: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: BTreeMap<String, ParameterSpec>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.parameters.insert(
            name.into(),
            ParameterSpec {
                param_type: param_type.into(),
                description: description.into(),
                required,
            },
        );
        self
    }

    /// Names of parameters marked `required`, in key order.
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|(_, spec)| spec.required)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// `{type: "function", function: {name, description, parameters}}`.
    pub fn to_wire(&self) -> Value {
        let properties = self
            .parameters
            .iter()
            .map(|(name, spec)| {
                (
                    name.clone(),
                    json!({ "type": spec.param_type, "description": spec.description }),
                )
            })
            .collect::<Map<String, Value>>();

        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": self.required_parameters(),
                }
            }
        })
    }

    pub fn from_wire(value: &Value) -> Result<Self, ProviderError> {
        let function = value
            .get("function")
            .and_then(Value::as_object)
            .ok_or_else(|| ProviderError::invalid_request("tool export is missing 'function'"))?;

        let name = function
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ProviderError::invalid_request("tool export is missing a name"))?;
        let description = function
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let schema = function.get("parameters");
        let required = schema
            .and_then(|schema| schema.get("required"))
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect::<Vec<_>>())
            .unwrap_or_default();

        let mut definition = Self::new(name, description);
        if let Some(properties) = schema
            .and_then(|schema| schema.get("properties"))
            .and_then(Value::as_object)
        {
            for (param, spec) in properties {
                definition = definition.with_parameter(
                    param.clone(),
                    spec.get("type").and_then(Value::as_str).unwrap_or("string"),
                    spec.get("description")
                        .and_then(Value::as_str)
                        .unwrap_or_default(),
                    required.contains(&param.as_str()),
                );
            }
        }

        if let Some(unknown) = required
            .iter()
            .find(|name| !definition.parameters.contains_key(**name))
        {
            return Err(ProviderError::invalid_request(format!(
                "required parameter '{unknown}' has no property schema"
            )));
        }

        Ok(definition)
    }
}
