//! JSON Schema validation for hazard registers.
//!
//! LLM output is checked against `schema/hazard_register.schema.json` before
//! any typed deserialization, so shape errors are reported with their JSON
//! path instead of a single serde message.

use std::sync::OnceLock;
use thiserror::Error;

/// Embedded register schema (loaded at compile time).
const REGISTER_SCHEMA_JSON: &str = include_str!("../schema/hazard_register.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema loading.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),
}

fn get_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = match serde_json::from_str(REGISTER_SCHEMA_JSON) {
            Ok(v) => v,
            Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
        };

        match jsonschema::options().build(&schema_value) {
            Ok(v) => Ok(v),
            Err(e) => Err(format!("Failed to compile schema: {}", e)),
        }
    });

    match result {
        Ok(v) => Ok(v),
        Err(e) => Err(SchemaError::LoadError(e.clone())),
    }
}

/// Validate a register JSON value against the schema.
///
/// Returns every violation, each suffixed with its instance path.
pub fn validate_register_schema(register: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(register)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check if a register JSON value is valid against the schema.
pub fn is_valid_register(register: &serde_json::Value) -> bool {
    get_validator()
        .map(|v| v.is_valid(register))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hazard() -> serde_json::Value {
        json!({
            "category": "Electrical",
            "danger_description": "Contact with live parts",
            "initial_gravity": 4,
            "initial_probability": 3,
            "preventive_measures": "Lockout; verify absence of voltage",
            "required_ppe": ["Insulated gloves"],
            "detailed_actions": "Apply lockout",
            "responsible_role": "Authorised electrician",
            "final_gravity": 4,
            "final_probability": 1
        })
    }

    #[test]
    fn test_valid_register_passes() {
        let value = json!({
            "steps": [{ "step_number": 1, "step_title": "Lockout", "hazards": [hazard()] }]
        });
        assert!(validate_register_schema(&value).is_ok());
        assert!(is_valid_register(&value));
    }

    #[test]
    fn test_missing_steps_fails() {
        let value = json!({ "global": {} });
        assert!(validate_register_schema(&value).is_err());
    }

    #[test]
    fn test_gravity_out_of_range_fails() {
        let mut h = hazard();
        h["initial_gravity"] = json!(6);
        let value = json!({ "steps": [{ "step_number": 1, "hazards": [h] }] });

        let errors = validate_register_schema(&value).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("initial_gravity")));
    }

    #[test]
    fn test_empty_hazard_list_fails() {
        let value = json!({ "steps": [{ "step_number": 1, "hazards": [] }] });
        assert!(!is_valid_register(&value));
    }

    #[test]
    fn test_more_than_five_hazards_fails() {
        let hazards: Vec<_> = (0..6).map(|_| hazard()).collect();
        let value = json!({ "steps": [{ "step_number": 1, "hazards": hazards }] });
        assert!(!is_valid_register(&value));
    }

    #[test]
    fn test_measures_as_array_fails() {
        let mut h = hazard();
        h["preventive_measures"] = json!(["Lockout"]);
        let value = json!({ "steps": [{ "step_number": 1, "hazards": [h] }] });
        assert!(!is_valid_register(&value));
    }
}
