use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{AngleCheck, Brightness};

/// Outcome of the pre-analysis quality gate. Immutable once produced;
/// attached to exactly one image record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityResult {
    pub passed: bool,
    /// Unweighted mean of the three sub-scores, rounded to nearest integer.
    pub overall_score: u8,
    pub clarity: u8,
    pub brightness: Brightness,
    pub brightness_score: u8,
    pub angle: AngleCheck,
    pub angle_score: u8,
    pub suggestions: Vec<String>,
    pub checked_at: DateTime<Utc>,
}
