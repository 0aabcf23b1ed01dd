//! Anomaly detection stage.
//!
//! Five clinical categories are evaluated independently; each category has
//! its own inclusion rule, confidence range, location catalog and severity
//! draw. The trait is the substitution point for a real vision model — any
//! implementation that returns typed, confidence-scored, located findings
//! satisfies the contract.

use rand::rngs::ThreadRng;
use rand::Rng;

use super::error::WorkflowError;
use crate::models::{Finding, FindingCategory, ImagePayload, Severity};

/// Produces zero or more findings from an image.
pub trait AnomalyDetector: Send + Sync {
    fn detect(&self, image: &ImagePayload) -> Result<Vec<Finding>, WorkflowError>;
}

/// Fixed tooth-site catalog: FDI notation plus a readable name.
pub const TOOTH_SITES: &[(&str, &str)] = &[
    ("11", "upper right central incisor"),
    ("12", "upper right lateral incisor"),
    ("13", "upper right canine"),
    ("21", "upper left central incisor"),
    ("22", "upper left lateral incisor"),
    ("31", "lower left central incisor"),
    ("32", "lower left lateral incisor"),
    ("41", "lower right central incisor"),
    ("42", "lower right lateral incisor"),
];

/// Fixed gum-region catalog.
pub const GUM_REGIONS: &[&str] = &[
    "upper anterior gingiva",
    "lower anterior gingiva",
    "right molar region",
    "left molar region",
    "generalized gingiva",
];

/// Canonical description per finding category.
pub fn description_of(category: FindingCategory) -> &'static str {
    match category {
        FindingCategory::Caries => "Possible cavitation or demineralization on the tooth surface",
        FindingCategory::Calculus => {
            "Mineralized deposits found along the gum line or between teeth"
        }
        FindingCategory::Gingivitis => "Gum tissue appears red, swollen or discolored",
        FindingCategory::Discoloration => {
            "Uneven surface shade or pigment deposits on the tooth"
        }
        FindingCategory::Recession => "Root surface partially exposed; gum height reduced",
        FindingCategory::Other => "Unclassified abnormality",
    }
}

/// Per-category inclusion probabilities for the stochastic stand-in.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub caries_probability: f64,
    /// Caries may contribute several findings in one pass.
    pub caries_max_findings: u32,
    pub calculus_probability: f64,
    pub gingivitis_probability: f64,
    pub discoloration_probability: f64,
    pub recession_probability: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            caries_probability: 0.4,
            caries_max_findings: 3,
            calculus_probability: 0.5,
            gingivitis_probability: 0.3,
            discoloration_probability: 0.35,
            recession_probability: 0.2,
        }
    }
}

/// Random stand-in for a real detection model.
#[derive(Debug, Clone, Default)]
pub struct SimulatedDetector {
    config: DetectorConfig,
}

impl SimulatedDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    fn tooth_site(rng: &mut ThreadRng) -> String {
        let (code, name) = TOOTH_SITES[rng.gen_range(0..TOOTH_SITES.len())];
        format!("{code} ({name})")
    }

    fn gum_region(rng: &mut ThreadRng) -> String {
        GUM_REGIONS[rng.gen_range(0..GUM_REGIONS.len())].to_string()
    }
}

impl AnomalyDetector for SimulatedDetector {
    fn detect(&self, image: &ImagePayload) -> Result<Vec<Finding>, WorkflowError> {
        if image.is_malformed() {
            return Err(WorkflowError::InvalidInput(
                "image payload is empty or unnamed".to_string(),
            ));
        }

        let mut rng = rand::thread_rng();
        let mut findings = Vec::new();

        if rng.gen_bool(self.config.caries_probability) {
            let count = rng.gen_range(1..=self.config.caries_max_findings);
            for _ in 0..count {
                let severity = if rng.gen_bool(0.5) { Severity::Moderate } else { Severity::Severe };
                findings.push(Finding::new(
                    FindingCategory::Caries,
                    rng.gen_range(60..95),
                    Self::tooth_site(&mut rng),
                    severity,
                    description_of(FindingCategory::Caries),
                ));
            }
        }

        if rng.gen_bool(self.config.calculus_probability) {
            findings.push(Finding::new(
                FindingCategory::Calculus,
                rng.gen_range(55..85),
                Self::gum_region(&mut rng),
                Severity::Mild,
                description_of(FindingCategory::Calculus),
            ));
        }

        if rng.gen_bool(self.config.gingivitis_probability) {
            let severity = if rng.gen_bool(0.4) { Severity::Mild } else { Severity::Moderate };
            findings.push(Finding::new(
                FindingCategory::Gingivitis,
                rng.gen_range(65..90),
                "gingiva",
                severity,
                description_of(FindingCategory::Gingivitis),
            ));
        }

        if rng.gen_bool(self.config.discoloration_probability) {
            findings.push(Finding::new(
                FindingCategory::Discoloration,
                rng.gen_range(50..80),
                Self::tooth_site(&mut rng),
                Severity::Mild,
                description_of(FindingCategory::Discoloration),
            ));
        }

        if rng.gen_bool(self.config.recession_probability) {
            let severity = if rng.gen_bool(0.5) { Severity::Moderate } else { Severity::Severe };
            findings.push(Finding::new(
                FindingCategory::Recession,
                rng.gen_range(60..88),
                Self::tooth_site(&mut rng),
                severity,
                description_of(FindingCategory::Recession),
            ));
        }

        Ok(findings)
    }
}

/// Deterministic detector returning a configured finding list verbatim.
/// The fixture implementation for workflow tests.
#[derive(Debug, Clone, Default)]
pub struct FixtureDetector {
    findings: Vec<Finding>,
}

impl FixtureDetector {
    pub fn new(findings: Vec<Finding>) -> Self {
        Self { findings }
    }
}

impl AnomalyDetector for FixtureDetector {
    fn detect(&self, image: &ImagePayload) -> Result<Vec<Finding>, WorkflowError> {
        if image.is_malformed() {
            return Err(WorkflowError::InvalidInput(
                "image payload is empty or unnamed".to_string(),
            ));
        }
        Ok(self.findings.clone())
    }
}
