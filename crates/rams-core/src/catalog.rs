//! Hazard category library.
//!
//! This is the closed taxonomy shared by the deterministic classifier and the
//! LLM prompt. Renderers group hazards by `name`, so both paths must draw
//! from this table and nothing else. Bump [`CATALOG_VERSION`] whenever an
//! entry is added, removed or re-scored.

use crate::scoring::{nir, residual_probability};
use crate::types::Hazard;

/// Version of the category table.
pub const CATALOG_VERSION: &str = "2025.1";

/// Key of the category used when no detector fires for a step.
pub const FALLBACK_CATEGORY_KEY: &str = "organisation";

/// Static template for one hazard category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HazardCategory {
    /// Stable identifier used by the detector table
    pub key: &'static str,

    /// Display name, grouped on by renderers
    pub name: &'static str,

    /// Default danger description
    pub description: &'static str,

    /// Default initial gravity (1-5)
    pub gravity: u8,

    /// Default initial probability (1-5)
    pub probability: u8,

    pub preventive_measures: &'static [&'static str],

    pub required_ppe: &'static [&'static str],

    pub detailed_actions: &'static str,

    pub responsible_role: &'static str,
}

impl HazardCategory {
    /// Build a hazard from this template.
    ///
    /// The initial probability is capped at `probability_ceiling`; gravity is
    /// intrinsic to the hazard and carried through to the residual score.
    pub fn instantiate(&self, probability_ceiling: u8, probability_reduction: u8) -> Hazard {
        let initial_gravity = self.gravity;
        let initial_probability = self.probability.min(probability_ceiling);
        let final_gravity = initial_gravity;
        let final_probability = residual_probability(
            initial_probability,
            probability_reduction,
            !self.preventive_measures.is_empty(),
        );

        Hazard {
            category: self.name.to_string(),
            danger_description: self.description.to_string(),
            initial_gravity,
            initial_probability,
            initial_nir: nir(initial_gravity, initial_probability),
            preventive_measures: self.preventive_measures.join("; "),
            required_ppe: self.required_ppe.iter().map(|p| p.to_string()).collect(),
            detailed_actions: self.detailed_actions.to_string(),
            responsible_role: self.responsible_role.to_string(),
            final_gravity,
            final_probability,
            final_nir: nir(final_gravity, final_probability),
        }
    }
}

/// The category table, in display order.
pub static CATALOG: &[HazardCategory] = &[
    HazardCategory {
        key: "electrical",
        name: "Electrical",
        description: "Electric shock or electrocution through direct or indirect contact with live parts",
        gravity: 4,
        probability: 3,
        preventive_measures: &[
            "Isolate and lock out the supply before any intervention",
            "Verify absence of voltage on every conductor with a tested detector",
            "Work only under an electrical authorisation matching the task",
        ],
        required_ppe: &["Insulated gloves", "Safety glasses", "Insulated tools"],
        detailed_actions: "Apply the lockout procedure, verify absence of voltage before touching any conductor and keep the isolation under personal padlock until the work is complete.",
        responsible_role: "Authorised electrician",
    },
    HazardCategory {
        key: "stored_energy",
        name: "Residual stored energy",
        description: "Release of energy remaining after isolation (capacitors, springs, pressure, inertia)",
        gravity: 4,
        probability: 2,
        preventive_measures: &[
            "Discharge capacitors and bleed residual pressure",
            "Mechanically block parts that can move under gravity or spring load",
            "Respect the documented discharge time before opening",
        ],
        required_ppe: &["Insulated gloves", "Safety glasses"],
        detailed_actions: "Identify every stored-energy source on the lockout sheet, dissipate or block each one and confirm zero-energy state before starting.",
        responsible_role: "Lockout supervisor",
    },
    HazardCategory {
        key: "arc_flash",
        name: "Arc flash",
        description: "Burns and projections caused by an electric arc during switching or measurement",
        gravity: 4,
        probability: 2,
        preventive_measures: &[
            "Keep the arc-flash boundary clear of non-essential staff",
            "Use measuring equipment rated for the installation category",
        ],
        required_ppe: &["Arc-rated face shield", "Arc-rated clothing", "Insulated gloves"],
        detailed_actions: "Check the instrument category before use, stand to the side of the enclosure when switching and wear arc-rated protection inside the boundary.",
        responsible_role: "Authorised electrician",
    },
    HazardCategory {
        key: "fall_from_height",
        name: "Fall from height",
        description: "Fall of a person while working on a ladder, platform, roof or elevated structure",
        gravity: 5,
        probability: 3,
        preventive_measures: &[
            "Use collective protection (guardrails, platforms) in priority",
            "Anchor a harness to a certified anchorage point when collective protection is impossible",
            "Inspect access equipment before use",
        ],
        required_ppe: &["Safety harness", "Hard hat", "Non-slip safety shoes"],
        detailed_actions: "Select a stable access means for the working height, inspect it, and keep three points of contact or a permanent harness connection while elevated.",
        responsible_role: "Site supervisor",
    },
    HazardCategory {
        key: "falling_objects",
        name: "Falling objects",
        description: "Tools, parts or materials falling onto people below the work area",
        gravity: 3,
        probability: 3,
        preventive_measures: &[
            "Mark out and restrict the area below the work position",
            "Tether tools used at height",
        ],
        required_ppe: &["Hard hat", "Safety shoes"],
        detailed_actions: "Set up a barrier below the work position, tether tools and keep loose parts in a closed container.",
        responsible_role: "Site supervisor",
    },
    HazardCategory {
        key: "atex",
        name: "ATEX ignition risk",
        description: "Ignition of an explosive atmosphere by a spark, hot surface or static discharge",
        gravity: 5,
        probability: 2,
        preventive_measures: &[
            "Measure the atmosphere continuously with a calibrated gas detector",
            "Use only ATEX-certified equipment in the classified zone",
            "Obtain a hot-work permit before any spark-producing task",
        ],
        required_ppe: &["Antistatic clothing", "Portable gas detector", "ATEX-certified tools"],
        detailed_actions: "Confirm the zone classification, ventilate and measure before entry, and stop work immediately if the detector alarms.",
        responsible_role: "ATEX-qualified technician",
    },
    HazardCategory {
        key: "hazardous_atmosphere",
        name: "Hazardous atmosphere",
        description: "Inhalation of toxic vapours or oxygen-deficient atmosphere",
        gravity: 4,
        probability: 2,
        preventive_measures: &[
            "Ventilate the area before and during the intervention",
            "Monitor oxygen and toxic gas levels",
        ],
        required_ppe: &["Portable gas detector", "Respiratory protection"],
        detailed_actions: "Ventilate, measure oxygen and toxic gas levels before entry and keep a watcher outside the area.",
        responsible_role: "HSE officer",
    },
    HazardCategory {
        key: "mechanical",
        name: "Mechanical",
        description: "Crushing, shearing or entanglement by moving machine parts",
        gravity: 4,
        probability: 3,
        preventive_measures: &[
            "Stop and lock out the drive before removing guards",
            "Refit all guards before restart",
        ],
        required_ppe: &["Safety gloves", "Safety shoes", "Close-fitting clothing"],
        detailed_actions: "Confirm the machine is at standstill and locked out, keep hands clear of pinch points and refit guards before handing back.",
        responsible_role: "Maintenance technician",
    },
    HazardCategory {
        key: "cuts",
        name: "Cuts and abrasions",
        description: "Cuts from sharp edges, tools or burrs during dismantling",
        gravity: 2,
        probability: 3,
        preventive_measures: &["Use suitable tools in good condition", "Deburr sharp edges"],
        required_ppe: &["Cut-resistant gloves", "Safety glasses"],
        detailed_actions: "Inspect tools before use and wear cut-resistant gloves when handling sheet metal or removed parts.",
        responsible_role: "Maintenance technician",
    },
    HazardCategory {
        key: "manual_handling",
        name: "Manual handling",
        description: "Musculoskeletal strain when lifting or carrying heavy components",
        gravity: 2,
        probability: 3,
        preventive_measures: &[
            "Use lifting aids for loads above 25 kg",
            "Plan the handling route and clear it beforehand",
        ],
        required_ppe: &["Safety gloves", "Safety shoes"],
        detailed_actions: "Assess the load weight, use a hoist or a second person when needed and keep the load close to the body.",
        responsible_role: "Team leader",
    },
    HazardCategory {
        key: "slips_trips",
        name: "Slips, trips and falls",
        description: "Slipping or tripping on the level while accessing or moving around the work area",
        gravity: 2,
        probability: 3,
        preventive_measures: &["Keep access routes clear and lit", "Clean up spills immediately"],
        required_ppe: &["Non-slip safety shoes"],
        detailed_actions: "Walk the access route before the intervention, remove obstacles and mark out cables crossing walkways.",
        responsible_role: "Team leader",
    },
    HazardCategory {
        key: "coactivity",
        name: "Co-activity",
        description: "Interference with other teams, vehicles or building occupants near the work area",
        gravity: 3,
        probability: 2,
        preventive_measures: &[
            "Coordinate with the site manager and other contractors",
            "Mark out the work area",
        ],
        required_ppe: &["High-visibility vest"],
        detailed_actions: "Inform the site contact on arrival, check the prevention plan and set up signage around the work area.",
        responsible_role: "Site supervisor",
    },
    HazardCategory {
        key: "unexpected_restart",
        name: "Unexpected restart",
        description: "Equipment energised or started while a person is still exposed",
        gravity: 4,
        probability: 2,
        preventive_measures: &[
            "Check that all staff are clear before removing padlocks",
            "Announce the restart to everyone on site",
        ],
        required_ppe: &["Safety gloves"],
        detailed_actions: "Perform a head count, remove tools and padlocks in the reverse lockout order and announce the restart before energising.",
        responsible_role: "Lockout supervisor",
    },
    HazardCategory {
        key: FALLBACK_CATEGORY_KEY,
        name: "Organisation",
        description: "Organisational risk: unclear instructions, missing coordination or insufficient competence",
        gravity: 2,
        probability: 2,
        preventive_measures: &[
            "Brief the team on the procedure before starting",
            "Confirm competence and authorisations of each participant",
        ],
        required_ppe: &["Safety shoes", "Safety glasses"],
        detailed_actions: "Hold a pre-job briefing, confirm each participant has read the procedure and record any deviation.",
        responsible_role: "Team leader",
    },
];

/// Look up a category by key.
pub fn lookup(key: &str) -> Option<&'static HazardCategory> {
    CATALOG.iter().find(|c| c.key == key)
}

/// Look up a category by display name.
pub fn by_name(name: &str) -> Option<&'static HazardCategory> {
    CATALOG.iter().find(|c| c.name == name)
}

/// Resolve a display name written by hand or by a model: surrounding
/// whitespace and case are ignored.
pub fn resolve_name(name: &str) -> Option<&'static HazardCategory> {
    let name = name.trim();
    CATALOG.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// All category display names, in table order.
pub fn category_names() -> Vec<&'static str> {
    CATALOG.iter().map(|c| c.name).collect()
}
