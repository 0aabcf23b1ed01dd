//! Quality gate — pre-analysis check that an image is fit for detection.
//!
//! The pass decision and sub-score mapping are pure and shared by every gate
//! implementation; only the way sub-checks are obtained differs between the
//! stochastic stand-in and the deterministic fixture.

use chrono::Utc;
use rand::Rng;

use super::error::WorkflowError;
use crate::models::{AngleCheck, Brightness, ImagePayload, QualityResult};

/// Pass thresholds for the quality gate.
pub mod quality_thresholds {
    /// Minimum clarity score for a usable image.
    pub const CLARITY_PASS_MIN: u8 = 70;
}

/// Produces a quality verdict for an uploaded image.
pub trait QualityGate: Send + Sync {
    fn evaluate(&self, image: &ImagePayload) -> Result<QualityResult, WorkflowError>;
}

/// Score mapped to each brightness classification.
pub fn brightness_score(brightness: Brightness) -> u8 {
    match brightness {
        Brightness::Good => 85,
        Brightness::TooDark => 40,
        Brightness::TooBright => 45,
    }
}

/// Score mapped to each angle classification.
pub fn angle_score(angle: AngleCheck) -> u8 {
    match angle {
        AngleCheck::Appropriate => 90,
        AngleCheck::NeedsAdjustment => 55,
    }
}

/// Compose the full result from the three sub-checks.
///
/// `passed` requires clarity at or above the threshold, good brightness and
/// an appropriate angle. The overall score is the unweighted mean of the
/// three sub-scores, rounded to nearest integer.
pub fn compose_result(clarity: u8, brightness: Brightness, angle: AngleCheck) -> QualityResult {
    let brightness_score = brightness_score(brightness);
    let angle_score = angle_score(angle);
    let passed = clarity >= quality_thresholds::CLARITY_PASS_MIN
        && brightness == Brightness::Good
        && angle == AngleCheck::Appropriate;
    let overall =
        (f64::from(clarity) + f64::from(brightness_score) + f64::from(angle_score)) / 3.0;

    QualityResult {
        passed,
        overall_score: overall.round() as u8,
        clarity,
        brightness,
        brightness_score,
        angle,
        angle_score,
        suggestions: suggestions(clarity, brightness, angle),
        checked_at: Utc::now(),
    }
}

/// Improvement suggestions, in fixed order: clarity, brightness, angle.
fn suggestions(clarity: u8, brightness: Brightness, angle: AngleCheck) -> Vec<String> {
    let mut suggestions = Vec::new();

    if clarity < quality_thresholds::CLARITY_PASS_MIN {
        suggestions.push("Keep the lens clean and hold the camera steady.".to_string());
    }

    match brightness {
        Brightness::TooDark => suggestions
            .push("Not enough light; retake in a bright spot or enable the flash.".to_string()),
        Brightness::TooBright => {
            suggestions.push("Too much light; avoid direct light sources.".to_string())
        }
        Brightness::Good => {}
    }

    if angle == AngleCheck::NeedsAdjustment {
        suggestions.push(
            "Adjust the shooting angle so the lens is parallel to the teeth.".to_string(),
        );
    }

    if suggestions.is_empty() {
        suggestions.push("Image quality is good; ready for analysis.".to_string());
    }

    suggestions
}

fn check_payload(image: &ImagePayload) -> Result<(), WorkflowError> {
    if image.is_malformed() {
        return Err(WorkflowError::InvalidInput(
            "image payload is empty or unnamed".to_string(),
        ));
    }
    Ok(())
}

/// Tunables for the stochastic stand-in gate.
#[derive(Debug, Clone)]
pub struct SimulatedQualityConfig {
    pub clarity_min: u8,
    pub clarity_max: u8,
    pub dark_probability: f64,
    pub bright_probability: f64,
    pub angle_fail_probability: f64,
}

impl Default for SimulatedQualityConfig {
    fn default() -> Self {
        Self {
            clarity_min: 70,
            clarity_max: 95,
            dark_probability: 0.15,
            bright_probability: 0.15,
            angle_fail_probability: 0.2,
        }
    }
}

/// Random stand-in for a real sharpness/exposure/framing model.
///
/// Deterministic in contract (always a well-formed `QualityResult`),
/// stochastic in outcome.
#[derive(Debug, Clone, Default)]
pub struct SimulatedQualityGate {
    config: SimulatedQualityConfig,
}

impl SimulatedQualityGate {
    pub fn new(config: SimulatedQualityConfig) -> Self {
        Self { config }
    }
}

impl QualityGate for SimulatedQualityGate {
    fn evaluate(&self, image: &ImagePayload) -> Result<QualityResult, WorkflowError> {
        check_payload(image)?;
        let mut rng = rand::thread_rng();

        let clarity = rng.gen_range(self.config.clarity_min..self.config.clarity_max);

        let draw: f64 = rng.gen();
        let brightness = if draw < self.config.dark_probability {
            Brightness::TooDark
        } else if draw > 1.0 - self.config.bright_probability {
            Brightness::TooBright
        } else {
            Brightness::Good
        };

        let angle = if rng.gen_bool(self.config.angle_fail_probability) {
            AngleCheck::NeedsAdjustment
        } else {
            AngleCheck::Appropriate
        };

        Ok(compose_result(clarity, brightness, angle))
    }
}

/// Deterministic gate returning a fixed verdict. The fixture implementation
/// for tests and for callers that already know the sub-check results.
#[derive(Debug, Clone)]
pub struct FixedQualityGate {
    pub clarity: u8,
    pub brightness: Brightness,
    pub angle: AngleCheck,
}

impl QualityGate for FixedQualityGate {
    fn evaluate(&self, image: &ImagePayload) -> Result<QualityResult, WorkflowError> {
        check_payload(image)?;
        Ok(compose_result(self.clarity, self.brightness, self.angle))
    }
}
