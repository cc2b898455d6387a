//! Procedure documents from YAML/JSON.
//!
//! The authoring application hands the engine a procedure and its ordered
//! steps. This module loads that pair from a file or string and rejects
//! documents the engine cannot number consistently.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::types::{ProcedureMetadata, Step};

/// Errors that can occur when loading a procedure document.
#[derive(Error, Debug)]
pub enum ProcedureError {
    #[error("Failed to read procedure file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Procedure validation failed: {0}")]
    ValidationError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Whether `path` ends in `.json`, in any case. Other files are read as YAML.
pub fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

const DECLARED_RISK_LEVEL: &str = "declared_risk_level";

/// The declared level caps every catalog probability, so it is never defaulted.
fn require_declared_level(present: bool) -> Result<(), ProcedureError> {
    if present {
        Ok(())
    } else {
        Err(ProcedureError::MissingField(format!(
            "procedure.{}",
            DECLARED_RISK_LEVEL
        )))
    }
}

/// A procedure together with its ordered steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureInput {
    pub procedure: ProcedureMetadata,

    #[serde(default)]
    pub steps: Vec<Step>,
}

impl ProcedureInput {
    /// Parse a procedure from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ProcedureError> {
        let document: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        let declared = document
            .get("procedure")
            .and_then(|p| p.get(DECLARED_RISK_LEVEL));
        require_declared_level(declared.is_some_and(|v| !v.is_null()))?;

        let input: ProcedureInput = serde_yaml::from_value(document)?;
        input.validate()?;
        Ok(input)
    }

    /// Parse a procedure from JSON string.
    pub fn from_json(json: &str) -> Result<Self, ProcedureError> {
        let document: serde_json::Value = serde_json::from_str(json)?;
        let declared = document
            .get("procedure")
            .and_then(|p| p.get(DECLARED_RISK_LEVEL));
        require_declared_level(declared.is_some_and(|v| !v.is_null()))?;

        let input: ProcedureInput = serde_json::from_value(document)?;
        input.validate()?;
        Ok(input)
    }

    /// Load a procedure file, choosing the format by extension.
    ///
    /// `.json` is parsed as JSON; anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProcedureError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        if has_json_extension(path) {
            Self::from_json(&contents)
        } else {
            Self::from_yaml(&contents)
        }
    }

    fn validate(&self) -> Result<(), ProcedureError> {
        if self.procedure.title.trim().is_empty() {
            return Err(ProcedureError::MissingField("procedure.title".to_string()));
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.number) {
                return Err(ProcedureError::ValidationError(format!(
                    "Duplicate step number: {}",
                    step.number
                )));
            }
            if step.title.trim().is_empty() {
                return Err(ProcedureError::MissingField(format!(
                    "steps[{}].title",
                    step.number
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RiskLevel;

    const VALID_PROCEDURE: &str = r#"
procedure:
  title: "Remplacement disjoncteur TGBT"
  category: "Electrical"
  declared_risk_level: high
  required_ppe: ["Gants isolants", "Écran facial"]
steps:
  - number: 1
    title: "Consignation du TGBT"
    instructions: "Ouvrir le sectionneur général et poser le cadenas"
    duration_minutes: 15
  - number: 2
    title: "Remplacement du disjoncteur"
    warning: "Vérifier l'absence de tension"
"#;

    #[test]
    fn test_parse_valid_procedure() {
        let input = ProcedureInput::from_yaml(VALID_PROCEDURE).unwrap();
        assert_eq!(input.procedure.declared_risk_level, RiskLevel::High);
        assert_eq!(input.procedure.required_ppe.len(), 2);
        assert_eq!(input.steps.len(), 2);
        assert_eq!(input.steps[0].duration_minutes, Some(15));
        assert!(input.steps[1].instructions.is_none());
    }

    #[test]
    fn test_parse_json_procedure() {
        let json = r#"{
            "procedure": { "title": "Pump overhaul", "declared_risk_level": "medium" },
            "steps": [{ "number": 1, "title": "Drain the pump" }]
        }"#;
        let input = ProcedureInput::from_json(json).unwrap();
        assert_eq!(input.procedure.title, "Pump overhaul");
        assert_eq!(input.steps[0].number, 1);
    }

    #[test]
    fn test_missing_title() {
        let yaml = r#"
procedure:
  title: ""
  declared_risk_level: low
steps: []
"#;
        let result = ProcedureInput::from_yaml(yaml);
        assert!(matches!(result, Err(ProcedureError::MissingField(_))));
    }

    #[test]
    fn test_duplicate_step_numbers() {
        let yaml = r#"
procedure:
  title: "Test"
  declared_risk_level: low
steps:
  - number: 1
    title: "First"
  - number: 1
    title: "Again"
"#;
        let result = ProcedureInput::from_yaml(yaml);
        assert!(matches!(result, Err(ProcedureError::ValidationError(_))));
    }

    #[test]
    fn test_unknown_risk_level_rejected() {
        let yaml = r#"
procedure:
  title: "Test"
  declared_risk_level: extreme
"#;
        assert!(matches!(
            ProcedureInput::from_yaml(yaml),
            Err(ProcedureError::YamlError(_))
        ));
    }

    #[test]
    fn test_declared_risk_level_is_required() {
        let yaml = r#"
procedure:
  title: "Graissage convoyeur"
steps:
  - number: 1
    title: "Graisser les paliers"
"#;
        match ProcedureInput::from_yaml(yaml) {
            Err(ProcedureError::MissingField(field)) => {
                assert_eq!(field, "procedure.declared_risk_level");
            }
            other => panic!("Expected MissingField, got {:?}", other),
        }

        let json = r#"{"procedure": {"title": "Pump overhaul", "declared_risk_level": null}, "steps": []}"#;
        assert!(matches!(
            ProcedureInput::from_json(json),
            Err(ProcedureError::MissingField(_))
        ));
    }

    #[test]
    fn test_has_json_extension() {
        assert!(has_json_extension(Path::new("proc.json")));
        assert!(has_json_extension(Path::new("PROC.JSON")));
        assert!(!has_json_extension(Path::new("proc.yaml")));
        assert!(!has_json_extension(Path::new("json")));
    }

    #[test]
    fn test_json_extension_is_case_insensitive() {
        let path = std::env::temp_dir().join("rams_procedure_case_test.JSON");
        fs::write(
            &path,
            r#"{"procedure": {"title": "Pump overhaul", "declared_risk_level": "low"}}"#,
        )
        .unwrap();

        let input = ProcedureInput::from_file(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(input.procedure.declared_risk_level, RiskLevel::Low);
    }
}
