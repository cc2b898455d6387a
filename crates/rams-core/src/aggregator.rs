//! Hazard register aggregation.
//!
//! Builds the global summary from per-step hazard lists. The rules are the
//! same whichever classifier produced the steps:
//! 1. `overall_risk` is the bucket of the highest initial NIR
//! 2. A step is critical if any of its hazards has initial NIR >= 12
//! 3. Categories are de-duplicated in first-appearance order

use crate::scoring::{bucket, CRITICAL_STEP_NIR};
use crate::types::{GlobalSummary, RiskAssessment, StepHazards};

/// Compute the global summary for a register.
pub fn aggregate(per_step: &[StepHazards]) -> GlobalSummary {
    let mut main_hazard_categories: Vec<String> = Vec::new();
    let mut critical_step_numbers = Vec::new();
    let mut total_hazard_count = 0;
    let mut max_initial_nir = 0;
    let mut max_final_nir = 0;

    for step in per_step {
        let mut critical = false;

        for hazard in &step.hazards {
            total_hazard_count += 1;
            max_initial_nir = max_initial_nir.max(hazard.initial_nir);
            max_final_nir = max_final_nir.max(hazard.final_nir);

            if hazard.initial_nir >= CRITICAL_STEP_NIR {
                critical = true;
            }
            if !main_hazard_categories.contains(&hazard.category) {
                main_hazard_categories.push(hazard.category.clone());
            }
        }

        if critical && !critical_step_numbers.contains(&step.step_number) {
            critical_step_numbers.push(step.step_number);
        }
    }

    GlobalSummary {
        overall_risk: bucket(max_initial_nir),
        main_hazard_categories,
        critical_step_numbers,
        total_hazard_count,
        max_initial_nir,
        max_final_nir,
    }
}

/// Pair per-step hazards with their summary.
pub fn build_assessment(steps: Vec<StepHazards>) -> RiskAssessment {
    RiskAssessment {
        global: aggregate(&steps),
        steps,
    }
}
