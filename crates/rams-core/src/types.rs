//! Shared data model for hazard registers.
//!
//! Field names serialize exactly as downstream renderers expect them
//! (`initial_NIR`, `max_final_NIR`, lowercase risk levels), so do not rename
//! them without coordinating with the document exporters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Four-level risk scale used both for the procedure's declared risk and for
/// the computed overall risk.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Procedure-level metadata supplied by the authoring application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcedureMetadata {
    /// Procedure title
    pub title: String,

    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,

    /// Equipment or trade category (e.g., "Electrical", "HVAC")
    #[serde(default)]
    pub category: Option<String>,

    /// Risk level declared by the procedure author
    pub declared_risk_level: RiskLevel,

    /// PPE the author already requires for the whole procedure
    #[serde(default)]
    pub required_ppe: Vec<String>,
}

impl ProcedureMetadata {
    pub fn new(title: impl Into<String>, declared_risk_level: RiskLevel) -> Self {
        Self {
            title: title.into(),
            declared_risk_level,
            ..Default::default()
        }
    }
}

/// One ordered step of a procedure. Owned by the caller, never mutated here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Step number, unique within the procedure
    pub number: u32,

    pub title: String,

    #[serde(default)]
    pub instructions: Option<String>,

    #[serde(default)]
    pub warning: Option<String>,

    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

impl Step {
    pub fn new(number: u32, title: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    /// Title, instructions and warning joined into one lowercase blob.
    pub fn text_blob(&self) -> String {
        let mut parts = vec![self.title.as_str()];
        if let Some(instructions) = &self.instructions {
            parts.push(instructions);
        }
        if let Some(warning) = &self.warning {
            parts.push(warning);
        }
        parts.join(" ").to_lowercase()
    }
}

/// A single classified risk. Created once per run and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hazard {
    pub category: String,
    pub danger_description: String,
    pub initial_gravity: u8,
    pub initial_probability: u8,
    #[serde(rename = "initial_NIR")]
    pub initial_nir: u8,
    pub preventive_measures: String,
    pub required_ppe: Vec<String>,
    pub detailed_actions: String,
    pub responsible_role: String,
    pub final_gravity: u8,
    pub final_probability: u8,
    #[serde(rename = "final_NIR")]
    pub final_nir: u8,
}

/// Hazards attached to one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepHazards {
    pub step_number: u32,
    pub step_title: String,
    pub hazards: Vec<Hazard>,
}

/// Register-wide summary computed by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSummary {
    pub overall_risk: RiskLevel,
    pub main_hazard_categories: Vec<String>,
    pub critical_step_numbers: Vec<u32>,
    pub total_hazard_count: usize,
    #[serde(rename = "max_initial_NIR")]
    pub max_initial_nir: u8,
    #[serde(rename = "max_final_NIR")]
    pub max_final_nir: u8,
}

/// The engine's sole output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub global: GlobalSummary,
    pub steps: Vec<StepHazards>,
}

impl RiskAssessment {
    /// Iterate over every hazard in step order.
    pub fn hazards(&self) -> impl Iterator<Item = &Hazard> {
        self.steps.iter().flat_map(|s| s.hazards.iter())
    }

    /// Find the hazards for a step number.
    pub fn step(&self, number: u32) -> Option<&StepHazards> {
        self.steps.iter().find(|s| s.step_number == number)
    }
}
