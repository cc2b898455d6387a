//! Prompt construction for hazard extraction.
//!
//! The rubrics are reproduced verbatim in every request so the model scores
//! on the same scale from one procedure to the next. Changing their wording
//! changes the scores; treat edits like a catalog re-scoring and bump
//! [`rams_core::CATALOG_VERSION`].

use rams_core::catalog::category_names;
use rams_core::{ProcedureMetadata, Step, MAX_HAZARDS_PER_STEP};

use crate::providers::ChatMessage;

/// System prompt for the extraction call.
pub const SYSTEM_PROMPT: &str = r#"
You are a senior HSE (health, safety and environment) engineer writing the risk
analysis section of a RAMS document for an industrial maintenance procedure.

Your task is to identify, for every step of the procedure, the hazards workers
are exposed to, and to score each hazard before and after preventive measures.

## Rules
1. Analyse EVERY step you are given, in the given order, and no other step
2. Use ONLY the hazard categories from the provided vocabulary, spelled exactly
3. List between 1 and 5 hazards per step, most severe first
4. Score gravity and probability with the rubrics below, integers 1 to 5
5. Residual probability must not exceed initial probability
6. If you list no preventive measure, residual probability equals initial probability
7. Answer with a single JSON object and nothing else
"#;

/// Gravity scale, 1 to 5.
pub const GRAVITY_RUBRIC: &str = r#"## Gravity rubric (G)
1 - Minor: discomfort or first aid only, no lost time
2 - Moderate: injury requiring medical care, lost time under 3 days
3 - Serious: injury with lost time over 3 days, reversible
4 - Severe: permanent disability or irreversible injury
5 - Catastrophic: fatality or multiple serious casualties"#;

/// Probability scale, 1 to 5.
pub const PROBABILITY_RUBRIC: &str = r#"## Probability rubric (P)
1 - Very unlikely: never observed in comparable operations
2 - Unlikely: could happen, already observed in the industry
3 - Possible: already observed on site or in the company
4 - Likely: observed several times a year on comparable operations
5 - Very likely: expected to occur during the operation if nothing is done"#;

/// Shape of the expected answer.
pub const OUTPUT_SCHEMA: &str = r#"## Output format (JSON)
{
  "steps": [
    {
      "step_number": 1,
      "step_title": "string",
      "hazards": [
        {
          "category": "one name from the vocabulary",
          "danger_description": "what can hurt whom, and how",
          "initial_gravity": 1,
          "initial_probability": 1,
          "preventive_measures": "measures separated by '; '",
          "required_ppe": ["string"],
          "detailed_actions": "what the operator does concretely",
          "responsible_role": "who enforces the measures",
          "final_gravity": 1,
          "final_probability": 1
        }
      ]
    }
  ]
}
Do not compute NIR values; they are derived from your scores."#;

/// Render the user-turn text describing the procedure and its steps.
pub fn render_procedure(procedure: &ProcedureMetadata, steps: &[Step]) -> String {
    let mut lines = vec![
        "## Procedure".to_string(),
        format!("Title: {}", procedure.title),
    ];
    if let Some(description) = &procedure.description {
        lines.push(format!("Description: {}", description));
    }
    if let Some(category) = &procedure.category {
        lines.push(format!("Category: {}", category));
    }
    lines.push(format!(
        "Declared risk level: {}",
        procedure.declared_risk_level
    ));
    if !procedure.required_ppe.is_empty() {
        lines.push(format!(
            "Required PPE: {}",
            procedure.required_ppe.join(", ")
        ));
    }

    lines.push(String::new());
    lines.push(format!("## Steps ({})", steps.len()));
    for step in steps {
        lines.push(format!("Step {}: {}", step.number, step.title));
        if let Some(instructions) = &step.instructions {
            lines.push(format!("  Instructions: {}", instructions));
        }
        if let Some(warning) = &step.warning {
            lines.push(format!("  Warning: {}", warning));
        }
        if let Some(minutes) = step.duration_minutes {
            lines.push(format!("  Duration: {} min", minutes));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Render the hazard vocabulary line list.
pub fn render_vocabulary() -> String {
    let mut out = String::from("## Hazard category vocabulary\n");
    for name in category_names() {
        out.push_str(&format!("- {}\n", name));
    }
    out
}

/// Build the full extraction conversation.
pub fn build_extraction_messages(procedure: &ProcedureMetadata, steps: &[Step]) -> Vec<ChatMessage> {
    let system = format!(
        "{}\n{}\n\n{}\n\n{}\n{}",
        SYSTEM_PROMPT.trim(),
        GRAVITY_RUBRIC,
        PROBABILITY_RUBRIC,
        render_vocabulary(),
        OUTPUT_SCHEMA,
    );

    let user = format!(
        "{}\nReturn the JSON register for all {} steps (1 to {} hazards each).",
        render_procedure(procedure, steps),
        steps.len(),
        MAX_HAZARDS_PER_STEP,
    );

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}
