//! Validation of LLM-produced hazard registers.
//!
//! Two passes: the embedded JSON Schema checks shape and score ranges, then
//! semantic checks tie the register to the procedure it was asked about.
//! Any finding rejects the whole register; nothing is repaired. NIR values
//! and the global summary are always recomputed here.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use serde_json::Value as JsonValue;

use rams_core::catalog::resolve_name;
use rams_core::scoring::{is_valid_score, nir};
use rams_core::{
    build_assessment, validate_register_schema, Hazard, RiskAssessment, Step, StepHazards,
    MAX_HAZARDS_PER_STEP,
};

#[derive(Debug, Deserialize)]
struct RawRegister {
    steps: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    step_number: u32,
    hazards: Vec<RawHazard>,
}

#[derive(Debug, Deserialize)]
struct RawHazard {
    category: String,
    danger_description: String,
    initial_gravity: u8,
    initial_probability: u8,
    preventive_measures: String,
    required_ppe: Vec<String>,
    detailed_actions: String,
    responsible_role: String,
    final_gravity: u8,
    final_probability: u8,
}

/// Validate a parsed register against the input steps.
///
/// On success the register is rebuilt in input step order, with input step
/// titles, canonical category names and recomputed NIRs.
pub fn validate_register(register: &JsonValue, steps: &[Step]) -> Result<RiskAssessment, Vec<String>> {
    validate_register_schema(register)?;

    let raw: RawRegister =
        serde_json::from_value(register.clone()).map_err(|e| vec![format!("register: {}", e)])?;

    let mut errors = Vec::new();
    let known: BTreeSet<u32> = steps.iter().map(|s| s.number).collect();
    let mut by_number: BTreeMap<u32, RawStep> = BTreeMap::new();

    for step in raw.steps {
        let number = step.step_number;
        if !known.contains(&number) {
            errors.push(format!("step {} is not part of the procedure", number));
            continue;
        }
        if by_number.contains_key(&number) {
            errors.push(format!("step {} appears more than once", number));
            continue;
        }
        check_step(&step, &mut errors);
        by_number.insert(number, step);
    }

    for step in steps {
        if !by_number.contains_key(&step.number) {
            errors.push(format!("step {} is missing", step.number));
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let per_step = steps
        .iter()
        .filter_map(|step| {
            by_number.remove(&step.number).map(|raw| StepHazards {
                step_number: step.number,
                step_title: step.title.clone(),
                hazards: raw.hazards.into_iter().map(into_hazard).collect(),
            })
        })
        .collect();

    Ok(build_assessment(per_step))
}

fn check_step(step: &RawStep, errors: &mut Vec<String>) {
    let n = step.step_number;
    if step.hazards.is_empty() || step.hazards.len() > MAX_HAZARDS_PER_STEP {
        errors.push(format!(
            "step {}: expected 1 to {} hazards, got {}",
            n,
            MAX_HAZARDS_PER_STEP,
            step.hazards.len()
        ));
    }

    for (i, hazard) in step.hazards.iter().enumerate() {
        let at = format!("step {} hazard {}", n, i + 1);

        if resolve_name(&hazard.category).is_none() {
            errors.push(format!("{}: unknown category '{}'", at, hazard.category));
        }

        for (field, value) in [
            ("initial_gravity", hazard.initial_gravity),
            ("initial_probability", hazard.initial_probability),
            ("final_gravity", hazard.final_gravity),
            ("final_probability", hazard.final_probability),
        ] {
            if !is_valid_score(value) {
                errors.push(format!("{}: {} {} is outside 1..=5", at, field, value));
            }
        }

        if hazard.final_probability > hazard.initial_probability {
            errors.push(format!(
                "{}: final_probability {} exceeds initial_probability {}",
                at, hazard.final_probability, hazard.initial_probability
            ));
        }

        if hazard.preventive_measures.trim().is_empty()
            && hazard.final_probability < hazard.initial_probability
        {
            errors.push(format!(
                "{}: probability reduced without any preventive measure",
                at
            ));
        }
    }
}

fn into_hazard(raw: RawHazard) -> Hazard {
    let category = resolve_name(&raw.category)
        .map(|c| c.name.to_string())
        .unwrap_or(raw.category);

    Hazard {
        category,
        danger_description: raw.danger_description,
        initial_gravity: raw.initial_gravity,
        initial_probability: raw.initial_probability,
        initial_nir: nir(raw.initial_gravity, raw.initial_probability),
        preventive_measures: raw.preventive_measures,
        required_ppe: raw.required_ppe,
        detailed_actions: raw.detailed_actions,
        responsible_role: raw.responsible_role,
        final_gravity: raw.final_gravity,
        final_probability: raw.final_probability,
        final_nir: nir(raw.final_gravity, raw.final_probability),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rams_core::RiskLevel;
    use serde_json::json;

    fn hazard(category: &str, g: u8, p: u8, fp: u8, measures: &str) -> JsonValue {
        json!({
            "category": category,
            "danger_description": "Contact with live parts",
            "initial_gravity": g,
            "initial_probability": p,
            "initial_NIR": 25,
            "preventive_measures": measures,
            "required_ppe": ["Insulating gloves"],
            "detailed_actions": "Verify absence of voltage",
            "responsible_role": "Site supervisor",
            "final_gravity": g,
            "final_probability": fp,
            "final_NIR": 25
        })
    }

    fn steps() -> Vec<Step> {
        vec![
            Step::new(1, "Consignation de l'armoire électrique"),
            Step::new(2, "Vérification visuelle finale"),
        ]
    }

    fn register(entries: Vec<(u32, Vec<JsonValue>)>) -> JsonValue {
        json!({
            "steps": entries
                .into_iter()
                .map(|(n, hazards)| json!({"step_number": n, "step_title": "ignored", "hazards": hazards}))
                .collect::<Vec<_>>()
        })
    }

    #[test]
    fn test_valid_register_recomputes_nir_and_summary() {
        let value = register(vec![
            (1, vec![hazard("electrical", 4, 3, 1, "Lockout; VAT")]),
            (2, vec![hazard("Organisation", 2, 2, 2, "")]),
        ]);

        let assessment = validate_register(&value, &steps()).unwrap();

        let first = &assessment.steps[0].hazards[0];
        assert_eq!(first.category, "Electrical");
        assert_eq!(first.initial_nir, 12);
        assert_eq!(first.final_nir, 4);
        assert_eq!(assessment.steps[0].step_title, "Consignation de l'armoire électrique");
        assert_eq!(assessment.global.max_initial_nir, 12);
        assert_eq!(assessment.global.overall_risk, RiskLevel::High);
        assert_eq!(assessment.global.critical_step_numbers, vec![1]);
    }

    #[test]
    fn test_output_follows_input_order() {
        let value = register(vec![
            (2, vec![hazard("Organisation", 2, 2, 2, "")]),
            (1, vec![hazard("Electrical", 4, 3, 1, "Lockout")]),
        ]);

        let assessment = validate_register(&value, &steps()).unwrap();
        let numbers: Vec<u32> = assessment.steps.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_unknown_step_rejected() {
        let value = register(vec![
            (1, vec![hazard("Electrical", 4, 3, 1, "Lockout")]),
            (2, vec![hazard("Organisation", 2, 2, 2, "")]),
            (7, vec![hazard("Organisation", 2, 2, 2, "")]),
        ]);

        let errors = validate_register(&value, &steps()).unwrap_err();
        assert_eq!(errors, vec!["step 7 is not part of the procedure".to_string()]);
    }

    #[test]
    fn test_missing_and_duplicate_steps_rejected() {
        let value = register(vec![
            (1, vec![hazard("Electrical", 4, 3, 1, "Lockout")]),
            (1, vec![hazard("Electrical", 4, 3, 1, "Lockout")]),
        ]);

        let errors = validate_register(&value, &steps()).unwrap_err();
        assert!(errors.contains(&"step 1 appears more than once".to_string()));
        assert!(errors.contains(&"step 2 is missing".to_string()));
    }

    #[test]
    fn test_unknown_category_rejected() {
        let value = register(vec![
            (1, vec![hazard("Alien invasion", 4, 3, 1, "Run")]),
            (2, vec![hazard("Organisation", 2, 2, 2, "")]),
        ]);

        let errors = validate_register(&value, &steps()).unwrap_err();
        assert!(errors[0].contains("unknown category 'Alien invasion'"));
    }

    #[test]
    fn test_residual_above_initial_rejected() {
        let value = register(vec![
            (1, vec![hazard("Electrical", 4, 2, 3, "Lockout")]),
            (2, vec![hazard("Organisation", 2, 2, 2, "")]),
        ]);

        let errors = validate_register(&value, &steps()).unwrap_err();
        assert!(errors[0].contains("exceeds initial_probability"));
    }

    #[test]
    fn test_reduction_without_measures_rejected() {
        let value = register(vec![
            (1, vec![hazard("Electrical", 4, 3, 1, "  ")]),
            (2, vec![hazard("Organisation", 2, 2, 2, "")]),
        ]);

        let errors = validate_register(&value, &steps()).unwrap_err();
        assert!(errors[0].contains("without any preventive measure"));
    }

    #[test]
    fn test_schema_violations_reported_first() {
        let value = register(vec![
            (1, vec![hazard("Electrical", 9, 3, 1, "Lockout")]),
            (2, vec![]),
        ]);

        let errors = validate_register(&value, &steps()).unwrap_err();
        assert!(errors.len() >= 2);
        assert!(errors.iter().all(|e| e.contains(" at ")));
    }

    #[test]
    fn test_missing_steps_key_rejected() {
        let errors = validate_register(&json!({"hazards": []}), &steps()).unwrap_err();
        assert!(!errors.is_empty());
    }
}
