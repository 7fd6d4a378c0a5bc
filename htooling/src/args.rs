//! JSON argument parsing helpers for tool handlers.
//!
//! ```rust
//! use htooling::{optional_string, parse_json_object, required_string};
//!
//! let args = parse_json_object(r#"{"location":"海淀区"}"#).expect("object should parse");
//! assert_eq!(required_string(&args, "location").expect("present"), "海淀区");
//! assert_eq!(optional_string(&args, "unit"), None);
//! ```

use serde_json::{Map, Value};

use crate::ToolError;

pub fn parse_json_value(args_json: &str) -> Result<Value, ToolError> {
    serde_json::from_str(args_json)
        .map_err(|err| ToolError::invalid_arguments(format!("invalid JSON arguments: {err}")))
}

/// Parses an argument object. Blank input is treated as `{}`.
pub fn parse_json_object(args_json: &str) -> Result<Map<String, Value>, ToolError> {
    if args_json.trim().is_empty() {
        return Ok(Map::new());
    }

    match parse_json_value(args_json)? {
        Value::Object(object) => Ok(object),
        _ => Err(ToolError::invalid_arguments("expected JSON object arguments")),
    }
}

/// Reads a non-blank string argument. Numbers are accepted and rendered as
/// text since handlers take string arguments.
pub fn required_string(args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    optional_string(args, key)
        .ok_or_else(|| ToolError::invalid_arguments(format!("missing required string: '{key}'")))
}

pub fn optional_string(args: &Map<String, Value>, key: &str) -> Option<String> {
    let value = match args.get(key)? {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };

    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolErrorKind;

    #[test]
    fn invalid_json_and_non_objects_are_invalid_arguments() {
        let error = parse_json_object("{bad json").expect_err("json should fail");
        assert_eq!(error.kind, ToolErrorKind::InvalidArguments);

        let error = parse_json_object("[1,2]").expect_err("array should fail");
        assert_eq!(error.kind, ToolErrorKind::InvalidArguments);

        assert!(parse_json_object("  ").expect("blank is empty").is_empty());
    }

    #[test]
    fn blank_strings_count_as_missing() {
        let args = parse_json_object(r#"{"location":"  ","code":110108}"#).expect("parses");
        assert!(required_string(&args, "location").is_err());
        assert_eq!(optional_string(&args, "code").as_deref(), Some("110108"));
    }
}
