//! Deterministic hazard classifier.
//!
//! Maps step text to hazard categories through the detector table and the
//! category library, producing the same register shape as the LLM path
//! without any network call.
//!
//! ## Guarantees
//!
//! 1. **Pure**: same procedure and steps always give the same register
//! 2. **Total**: every step gets between one and [`MAX_HAZARDS_PER_STEP`] hazards
//! 3. **Consistent**: residual probability never exceeds initial probability

mod detectors;

pub use detectors::{category_keys, detect_step_types, StepType, StepTypeDetector, DETECTORS};

use serde::{Deserialize, Serialize};

use crate::aggregator::build_assessment;
use crate::catalog::{self, FALLBACK_CATEGORY_KEY};
use crate::scoring::probability_ceiling;
use crate::types::{ProcedureMetadata, RiskAssessment, Step, StepHazards};

/// Upper bound on hazards listed per step, to keep documents readable.
pub const MAX_HAZARDS_PER_STEP: usize = 5;

/// Probability points removed by preventive measures when synthesizing the
/// residual score. Business-tunable; override through [`ClassifierConfig`].
pub const DEFAULT_PROBABILITY_REDUCTION: u8 = 2;

/// Tunables for the deterministic classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_probability_reduction")]
    pub probability_reduction: u8,
}

fn default_probability_reduction() -> u8 {
    DEFAULT_PROBABILITY_REDUCTION
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            probability_reduction: DEFAULT_PROBABILITY_REDUCTION,
        }
    }
}

/// Rule-based hazard classifier.
#[derive(Debug, Clone, Default)]
pub struct HazardClassifier {
    config: ClassifierConfig,
}

impl HazardClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify every step and aggregate the register.
    pub fn classify(&self, procedure: &ProcedureMetadata, steps: &[Step]) -> RiskAssessment {
        let per_step = steps
            .iter()
            .map(|step| self.classify_step(procedure, step))
            .collect();
        build_assessment(per_step)
    }

    /// Classify a single step.
    pub fn classify_step(&self, procedure: &ProcedureMetadata, step: &Step) -> StepHazards {
        let text = step.text_blob();
        let mut keys = category_keys(&text);
        if keys.is_empty() {
            keys.push(FALLBACK_CATEGORY_KEY);
        }

        let ceiling = probability_ceiling(procedure.declared_risk_level);
        let mut hazards: Vec<_> = keys
            .iter()
            .filter_map(|key| catalog::lookup(key))
            .map(|category| category.instantiate(ceiling, self.config.probability_reduction))
            .collect();

        // Stable: ties keep detector order.
        hazards.sort_by(|a, b| b.initial_nir.cmp(&a.initial_nir));
        hazards.truncate(MAX_HAZARDS_PER_STEP);

        tracing::trace!(
            step = step.number,
            categories = ?keys,
            kept = hazards.len(),
            "Classified step"
        );

        StepHazards {
            step_number: step.number,
            step_title: step.title.clone(),
            hazards,
        }
    }
}

/// Classify with the default configuration.
pub fn classify(procedure: &ProcedureMetadata, steps: &[Step]) -> RiskAssessment {
    HazardClassifier::default().classify(procedure, steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RiskLevel;

    fn procedure(level: RiskLevel) -> ProcedureMetadata {
        ProcedureMetadata::new("Maintenance TGBT", level)
    }

    #[test]
    fn test_lockout_step_yields_electrical_and_stored_energy() {
        let steps = vec![Step::new(
            1,
            "Consignation de l'armoire électrique avant intervention",
        )];
        let result = classify(&procedure(RiskLevel::High), &steps);

        let hazards = &result.steps[0].hazards;
        let categories: Vec<_> = hazards.iter().map(|h| h.category.as_str()).collect();
        assert!(categories.contains(&"Electrical"));
        assert!(categories.contains(&"Residual stored energy"));

        let electrical = hazards.iter().find(|h| h.category == "Electrical").unwrap();
        assert_eq!(electrical.initial_gravity, 4);
        assert!(hazards.iter().all(|h| h.initial_gravity == 4));
    }

    #[test]
    fn test_unmatched_step_yields_single_organisation_hazard() {
        let steps = vec![Step::new(7, "Vérification visuelle finale")];
        let result = classify(&procedure(RiskLevel::Medium), &steps);

        assert_eq!(result.steps.len(), 1);
        let hazards = &result.steps[0].hazards;
        assert_eq!(hazards.len(), 1);
        assert_eq!(hazards[0].category, "Organisation");
    }

    #[test]
    fn test_probability_capped_by_declared_level() {
        let steps = vec![Step::new(1, "Travail en hauteur sur nacelle")];

        let low = classify(&procedure(RiskLevel::Low), &steps);
        let critical = classify(&procedure(RiskLevel::Critical), &steps);

        let fall_low = low.steps[0].hazards.iter().find(|h| h.category == "Fall from height").unwrap();
        let fall_critical = critical.steps[0]
            .hazards
            .iter()
            .find(|h| h.category == "Fall from height")
            .unwrap();

        assert_eq!(fall_low.initial_probability, 2);
        assert_eq!(fall_critical.initial_probability, 3);
        assert_eq!(fall_low.initial_gravity, 5);
    }

    #[test]
    fn test_hazards_sorted_and_truncated() {
        let step = Step::new(3, "Démontage du moteur sur l'échelle")
            .with_instructions("Consignation du coffret électrique puis levage au palan")
            .with_warning("Zone ATEX");
        let result = classify(&procedure(RiskLevel::Critical), &[step]);

        let hazards = &result.steps[0].hazards;
        assert_eq!(hazards.len(), MAX_HAZARDS_PER_STEP);
        for pair in hazards.windows(2) {
            assert!(pair[0].initial_nir >= pair[1].initial_nir);
        }
    }

    #[test]
    fn test_reduction_is_configurable() {
        let classifier = HazardClassifier::new(ClassifierConfig {
            probability_reduction: 0,
        });
        let steps = vec![Step::new(1, "Ouvrir le tableau électrique")];
        let result = classifier.classify(&procedure(RiskLevel::High), &steps);

        for hazard in result.hazards() {
            assert_eq!(hazard.final_probability, hazard.initial_probability);
        }
    }

    #[test]
    fn test_step_order_preserved() {
        let steps = vec![
            Step::new(10, "Accès au local"),
            Step::new(2, "Remise en service"),
            Step::new(5, "Contrôle final"),
        ];
        let result = classify(&procedure(RiskLevel::Medium), &steps);
        let numbers: Vec<_> = result.steps.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![10, 2, 5]);
    }

    #[test]
    fn test_config_deserializes_with_default() {
        let config: ClassifierConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.probability_reduction, DEFAULT_PROBABILITY_REDUCTION);
    }
}
