use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{FindingCategory, Severity};

/// A single detected clinical abnormality.
///
/// Produced zero-or-more per detection pass; order is insertion order and
/// carries no meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub id: Uuid,
    pub category: FindingCategory,
    /// Detector confidence, 0-100.
    pub confidence: u8,
    /// Tooth-site or gum-region descriptor from the fixed catalog.
    pub location: String,
    pub severity: Severity,
    pub description: String,
}

impl Finding {
    pub fn new(
        category: FindingCategory,
        confidence: u8,
        location: impl Into<String>,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            confidence,
            location: location.into(),
            severity,
            description: description.into(),
        }
    }
}
