//! # rams-core
//!
//! Deterministic risk assessment engine for maintenance procedures.
//!
//! This crate turns an ordered list of procedure steps into a scored hazard
//! register (the risk analysis of a RAMS document):
//! - Which hazards does each step expose workers to?
//! - How severe and how likely is each one, before and after mitigation?
//! - Which steps and categories dominate the overall risk?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input always produces byte-identical output
//! 2. **No LLM calls**: Classification is rule-based
//! 3. **Consistent scoring**: NIR = gravity × probability, residual ≤ initial
//! 4. **Total**: Every step gets at least one hazard, at most five
//!
//! ## Example
//!
//! ```rust
//! use rams_core::{classify, ProcedureMetadata, RiskLevel, Step};
//!
//! let procedure = ProcedureMetadata::new("Remplacement disjoncteur", RiskLevel::High);
//! let steps = vec![Step::new(1, "Consignation de l'armoire électrique avant intervention")];
//!
//! let assessment = classify(&procedure, &steps);
//! assert!(assessment.global.main_hazard_categories.contains(&"Electrical".to_string()));
//! ```

pub mod aggregator;
pub mod catalog;
pub mod classifier;
pub mod procedure;
pub mod schema;
pub mod scoring;
pub mod types;

// Re-export main types at crate root
pub use aggregator::{aggregate, build_assessment};
pub use catalog::{HazardCategory, CATALOG, CATALOG_VERSION};
pub use classifier::{
    classify, ClassifierConfig, HazardClassifier, StepType, DEFAULT_PROBABILITY_REDUCTION,
    MAX_HAZARDS_PER_STEP,
};
pub use procedure::{ProcedureError, ProcedureInput};
pub use schema::{is_valid_register, validate_register_schema};
pub use scoring::{bucket, nir};
pub use types::{
    GlobalSummary, Hazard, ProcedureMetadata, RiskAssessment, RiskLevel, Step, StepHazards,
};
