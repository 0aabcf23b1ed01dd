use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AnalysisStatus, RiskTier};
use super::finding::Finding;

/// Persistent record of one completed detection pass over one image.
///
/// Created exactly once per pass, mutated only by review, deleted only as a
/// cascade of deleting its image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub image_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub findings: Vec<Finding>,
    /// Weighted aggregate, one decimal place.
    pub risk_score: f64,
    pub risk_tier: RiskTier,
    pub recommendation: String,
    pub status: AnalysisStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewer_name: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewer_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
