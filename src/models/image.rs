use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ImageStatus;
use super::quality::QualityResult;
use super::user::Identity;

/// An uploaded image as the pipeline stages see it.
///
/// The engine never decodes pixels; gates and detectors take the payload as
/// an opaque value. Real decoding belongs behind the detector trait.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), bytes }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Malformed input: nothing to analyze, or no name to file it under.
    pub fn is_malformed(&self) -> bool {
        self.bytes.is_empty() || self.file_name.trim().is_empty()
    }
}

/// Persistent record of one uploaded image. Owned by the review workflow
/// once created; mutated only through workflow operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    /// Opaque reference to the stored payload (path, blob key, ...).
    pub payload_ref: String,
    pub file_name: String,
    pub file_size: u64,
    pub uploaded_at: DateTime<Utc>,
    pub quality_check: Option<QualityResult>,
    pub analysis_id: Option<Uuid>,
    pub status: ImageStatus,
}

impl ImageRecord {
    pub fn new(owner: &Identity, payload: &ImagePayload, payload_ref: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: owner.id,
            user_name: owner.name.clone(),
            payload_ref,
            file_name: payload.file_name.clone(),
            file_size: payload.size(),
            uploaded_at: Utc::now(),
            quality_check: None,
            analysis_id: None,
            status: ImageStatus::Uploaded,
        }
    }
}
