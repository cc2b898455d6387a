//! Step-type detectors.
//!
//! Each detector pairs a pattern with the hazard category keys it implies.
//! The table is evaluated in order and detectors are not exclusive: a step
//! that both climbs a ladder and opens a cabinet fires two of them.
//!
//! Patterns cover the French and English vocabulary used by procedure
//! authors. Add a new vocabulary term to an existing pattern rather than
//! adding a detector; new detectors change which categories a step gets.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

/// Kind of work a step performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    AccessPreparation,
    EnergyIsolation,
    LiveMeasurement,
    ElectricalWork,
    ExplosiveAtmosphere,
    HeightWork,
    MechanicalWork,
    Commissioning,
}

/// One row of the detector table.
pub struct StepTypeDetector {
    pub step_type: StepType,
    pattern: Regex,
    pub categories: &'static [&'static str],
}

impl StepTypeDetector {
    fn new(step_type: StepType, pattern: &str, categories: &'static [&'static str]) -> Self {
        Self {
            step_type,
            // Patterns are literals in this file and covered by tests.
            pattern: Regex::new(pattern).unwrap(),
            categories,
        }
    }

    /// Whether this detector fires for the given step text.
    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

lazy_static! {
    /// Detector table, in evaluation order.
    pub static ref DETECTORS: Vec<StepTypeDetector> = vec![
        StepTypeDetector::new(
            StepType::AccessPreparation,
            r"(?i)\b(acc[eè]s|access\w*|pr[ée]paration|prepar\w*|balis\w*|signalis\w*|zone de travail|work area|p[ée]rim[eè]tre|arriv[ée]e|permis de travail|work permit|d[ée]placement)\b",
            &["slips_trips", "coactivity"],
        ),
        StepTypeDetector::new(
            StepType::EnergyIsolation,
            r"(?i)\b(consign\w*|lock-?out|loto|tag-?out|cadenas\w*|padlock\w*|isoler|isolation|isolat(?:e|ed|ing)|isolement de l['’][ée]nergie|sectionn\w*|condamn\w*)\b",
            &["electrical", "stored_energy"],
        ),
        StepTypeDetector::new(
            StepType::LiveMeasurement,
            r"(?i)\b(mesur\w*|measur\w*|multim[eè]tre|multimeter|vat|absence de tension|sous tension|live|pince amp[eè]rem[eè]trique|clamp meter|test de tension|voltage test\w*)\b",
            &["electrical", "arc_flash"],
        ),
        StepTypeDetector::new(
            StepType::ElectricalWork,
            r"(?i)([ée]lectri\w*|\barmoire\w*|\btableau\w*|\bc[aâ]bl\w*|\bdisjoncteur\w*|\bbreaker\w*|\bbornier\w*|\bterminal block|\btension\b|\bvoltage\b|\b\d+\s?k?v\b|\bcontacteur\w*|\bcontactor\w*|\bvariateur\w*|\bfusible\w*|\bfuses?\b)",
            &["electrical", "arc_flash"],
        ),
        StepTypeDetector::new(
            StepType::ExplosiveAtmosphere,
            r"(?i)\b(atex|explosi\w*|inflammable\w*|flammable|gaz|gas|solvant\w*|solvent\w*|zone\s*[012]|hydrocarbure\w*|hydrocarbon\w*|carburant\w*|fuel\w*)\b",
            &["atex", "hazardous_atmosphere"],
        ),
        StepTypeDetector::new(
            StepType::HeightWork,
            r"(?i)\b(hauteur\w*|height\w*|[ée]chelle\w*|ladder\w*|nacelle\w*|escabeau\w*|toiture\w*|roof\w*|scaffold\w*|[ée]chafaud\w*|harnais|harness\w*|mezzanine\w*|pemp|passerelle\w*|catwalk\w*)\b",
            &["fall_from_height", "falling_objects"],
        ),
        StepTypeDetector::new(
            StepType::MechanicalWork,
            r"(?i)\b(m[ée]cani\w*|mechanic\w*|d[ée]mont\w*|dismantl\w*|moteur\w*|motor\w*|pompe\w*|pump\w*|roulement\w*|bearing\w*|courroie\w*|belt\w*|serrage|tighten\w*|desserr\w*|loosen\w*|accouplement\w*|coupling\w*|engrenage\w*|gear\w*|levage|lifting|palan\w*|hoist\w*)\b",
            &["mechanical", "cuts", "manual_handling"],
        ),
        StepTypeDetector::new(
            StepType::Commissioning,
            r"(?i)\b(remise en service|mise en service|recommission\w*|commissioning|red[ée]marr\w*|restart\w*|remontage|r[ée]assembl\w*|reassembl\w*|d[ée]consign\w*|fermeture|closing|essais? de fonctionnement|functional test\w*)\b",
            &["unexpected_restart", "coactivity"],
        ),
    ];
}

/// Step types detected in a text blob, in table order.
pub fn detect_step_types(text: &str) -> Vec<StepType> {
    DETECTORS
        .iter()
        .filter(|d| d.matches(text))
        .map(|d| d.step_type)
        .collect()
}

/// Category keys implied by a text blob, de-duplicated in insertion order.
pub fn category_keys(text: &str) -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = Vec::new();
    for detector in DETECTORS.iter().filter(|d| d.matches(text)) {
        for key in detector.categories {
            if !keys.contains(key) {
                keys.push(key);
            }
        }
    }
    keys
}
