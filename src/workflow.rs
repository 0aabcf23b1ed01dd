//! Review workflow — owns the lifecycle of an image/analysis record pair.
//!
//! State machine:
//! - ImageRecord: `uploaded → {quality_passed | quality_failed} → analyzed`
//!   (`analyzed` reachable only from `quality_passed`; `quality_failed` is
//!   terminal and never gets an analysis).
//! - AnalysisRecord, created at the `analyzed` transition:
//!   `pending_review → {reviewed | follow_up_scheduled}`.
//!
//! Every operation is a read-modify-write over one record pair, serialized
//! against other operations on the same pair by a per-pair lock keyed by
//! image id. Validation happens against in-memory copies before the single
//! `put`/`put_all` at the end, so a failed operation writes nothing.
//!
//! Operations that notify return their `NotificationEvent`s as explicit
//! output instead of calling a dispatcher, so emissions are assertable.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use crate::db::{self, Collection, Storage, StorageError};
use crate::models::{
    AnalysisRecord, AnalysisStatus, Finding, Identity, ImagePayload, ImageRecord, ImageStatus,
    NotificationEvent, NotificationKind, NotificationPriority, QualityResult, ReviewOutcome,
    RiskTier,
};
use crate::pipeline::error::WorkflowError;
use crate::pipeline::risk::RiskResult;
use crate::pipeline::trend::HistoryEntry;

/// Per-record-pair locks keyed by image id.
///
/// Operations on different pairs never contend; operations on the same pair
/// serialize, so `record_analysis` racing `delete_image` cannot interleave.
struct RecordLocks {
    inner: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl RecordLocks {
    fn new() -> Self {
        Self { inner: Mutex::new(HashMap::new()) }
    }

    fn for_image(&self, image_id: Uuid) -> Result<Arc<Mutex<()>>, WorkflowError> {
        let mut map = self
            .inner
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        Ok(Arc::clone(
            map.entry(image_id).or_insert_with(|| Arc::new(Mutex::new(()))),
        ))
    }
}

/// A typed review submission. Single shape on purpose: the engine does not
/// support positional/object call-shape polymorphism for reviews.
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub analysis_id: Uuid,
    pub reviewer: Identity,
    pub outcome: ReviewOutcome,
    pub notes: Option<String>,
}

/// Output of `record_analysis`.
#[derive(Debug, Clone)]
pub struct RecordedAnalysis {
    pub analysis: AnalysisRecord,
    pub image: ImageRecord,
    pub events: Vec<NotificationEvent>,
}

/// Output of `apply_review`.
#[derive(Debug, Clone)]
pub struct ReviewedAnalysis {
    pub analysis: AnalysisRecord,
    pub events: Vec<NotificationEvent>,
}

/// Output of `delete_image`. Deleting an absent id is a no-op, so both
/// flags can be false.
#[derive(Debug, Clone, Copy)]
pub struct DeleteOutcome {
    pub removed_image: bool,
    pub removed_analysis: bool,
}

pub struct ReviewWorkflow {
    store: Arc<dyn Storage>,
    locks: RecordLocks,
}

impl ReviewWorkflow {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store, locks: RecordLocks::new() }
    }

    /// Create an ImageRecord in `uploaded` for a validated payload.
    pub fn register_upload(
        &self,
        owner: &Identity,
        payload: &ImagePayload,
        payload_ref: impl Into<String>,
    ) -> Result<ImageRecord, WorkflowError> {
        if payload.is_malformed() {
            return Err(WorkflowError::InvalidInput(
                "image payload is empty or unnamed".to_string(),
            ));
        }

        let record = ImageRecord::new(owner, payload, payload_ref.into());

        let lock = self.locks.for_image(record.id)?;
        let _guard = lock.lock().map_err(|e| StorageError::Poisoned(e.to_string()))?;

        let mut images: Vec<ImageRecord> = db::load_all(self.store.as_ref(), Collection::Images)?;
        images.push(record.clone());
        db::store_all(self.store.as_ref(), Collection::Images, &images)?;

        tracing::info!(image_id = %record.id, user = %record.user_name, "image registered");
        Ok(record)
    }

    /// Attach a quality verdict and transition to `quality_passed` or
    /// `quality_failed`.
    ///
    /// Re-submission is last-write-wins: the QualityResult is advisory, not
    /// authoritative history.
    pub fn submit_quality(
        &self,
        image_id: Uuid,
        quality: QualityResult,
    ) -> Result<ImageRecord, WorkflowError> {
        let lock = self.locks.for_image(image_id)?;
        let _guard = lock.lock().map_err(|e| StorageError::Poisoned(e.to_string()))?;

        let mut images: Vec<ImageRecord> = db::load_all(self.store.as_ref(), Collection::Images)?;
        let image = find_image_mut(&mut images, image_id)?;

        image.status = if quality.passed {
            ImageStatus::QualityPassed
        } else {
            ImageStatus::QualityFailed
        };
        image.quality_check = Some(quality);
        let updated = image.clone();

        db::store_all(self.store.as_ref(), Collection::Images, &images)?;

        tracing::info!(
            image_id = %updated.id,
            status = %updated.status,
            "quality verdict recorded"
        );
        Ok(updated)
    }

    /// Create the analysis record for a quality-passed image, link the pair
    /// and transition the image to `analyzed`.
    ///
    /// High-tier results emit exactly one `high_risk_alert` event for the
    /// owning user.
    pub fn record_analysis(
        &self,
        image_id: Uuid,
        findings: Vec<Finding>,
        risk: RiskResult,
    ) -> Result<RecordedAnalysis, WorkflowError> {
        let lock = self.locks.for_image(image_id)?;
        let _guard = lock.lock().map_err(|e| StorageError::Poisoned(e.to_string()))?;

        let mut images: Vec<ImageRecord> = db::load_all(self.store.as_ref(), Collection::Images)?;
        let image = find_image_mut(&mut images, image_id)?;

        if image.status != ImageStatus::QualityPassed {
            return Err(WorkflowError::InvalidState {
                operation: "record_analysis",
                expected: ImageStatus::QualityPassed.as_str(),
                actual: image.status.as_str().to_string(),
            });
        }

        let analysis = AnalysisRecord {
            id: Uuid::new_v4(),
            image_id,
            user_id: image.user_id,
            user_name: image.user_name.clone(),
            findings,
            risk_score: risk.score,
            risk_tier: risk.tier,
            recommendation: risk.recommendation,
            status: AnalysisStatus::PendingReview,
            reviewed_by: None,
            reviewer_name: None,
            reviewed_at: None,
            reviewer_notes: None,
            created_at: Utc::now(),
        };

        image.analysis_id = Some(analysis.id);
        image.status = ImageStatus::Analyzed;
        let updated_image = image.clone();

        let mut analyses: Vec<AnalysisRecord> =
            db::load_all(self.store.as_ref(), Collection::Analyses)?;
        analyses.push(analysis.clone());

        // Both collections in one atomic write: no observable half-link.
        self.store.put_all(vec![
            (Collection::Images, db::encode_all(&images)?),
            (Collection::Analyses, db::encode_all(&analyses)?),
        ])?;

        let mut events = Vec::new();
        if analysis.risk_tier == RiskTier::High {
            events.push(NotificationEvent {
                kind: NotificationKind::HighRiskAlert,
                user_id: analysis.user_id,
                related_id: analysis.id,
                priority: NotificationPriority::High,
                title: "High-risk anomaly detected".to_string(),
                message: format!(
                    "The image you uploaded on {} shows a high-risk result. \
                     Please arrange a dental visit soon.",
                    updated_image.uploaded_at.format("%Y-%m-%d"),
                ),
            });
        }

        tracing::info!(
            image_id = %image_id,
            analysis_id = %analysis.id,
            tier = %analysis.risk_tier,
            score = analysis.risk_score,
            "analysis recorded"
        );
        Ok(RecordedAnalysis { analysis, image: updated_image, events })
    }

    /// Apply a reviewer's verdict to an analysis.
    ///
    /// Re-review is permitted and overwrites the previous reviewer fields;
    /// this also keeps notes amendable after a terminal outcome. Outcome
    /// `reviewed` emits exactly one `review_completed` event.
    pub fn apply_review(
        &self,
        request: ReviewRequest,
    ) -> Result<ReviewedAnalysis, WorkflowError> {
        // Resolve the pair lock through the analysis's image reference.
        let image_id = {
            let analyses: Vec<AnalysisRecord> =
                db::load_all(self.store.as_ref(), Collection::Analyses)?;
            analyses
                .iter()
                .find(|a| a.id == request.analysis_id)
                .map(|a| a.image_id)
                .ok_or_else(|| WorkflowError::NotFound {
                    entity: "analysis",
                    id: request.analysis_id.to_string(),
                })?
        };

        let lock = self.locks.for_image(image_id)?;
        let _guard = lock.lock().map_err(|e| StorageError::Poisoned(e.to_string()))?;

        // Re-read under the lock: a cascade may have removed the record
        // between lookup and lock acquisition.
        let mut analyses: Vec<AnalysisRecord> =
            db::load_all(self.store.as_ref(), Collection::Analyses)?;
        let analysis = analyses
            .iter_mut()
            .find(|a| a.id == request.analysis_id)
            .ok_or_else(|| WorkflowError::NotFound {
                entity: "analysis",
                id: request.analysis_id.to_string(),
            })?;

        analysis.reviewed_by = Some(request.reviewer.id);
        analysis.reviewer_name = Some(request.reviewer.name.clone());
        analysis.reviewed_at = Some(Utc::now());
        analysis.reviewer_notes = request.notes;
        analysis.status = request.outcome.into();
        let updated = analysis.clone();

        db::store_all(self.store.as_ref(), Collection::Analyses, &analyses)?;

        let mut events = Vec::new();
        if request.outcome == ReviewOutcome::Reviewed {
            events.push(NotificationEvent {
                kind: NotificationKind::ReviewCompleted,
                user_id: updated.user_id,
                related_id: updated.id,
                priority: NotificationPriority::Medium,
                title: "Review completed".to_string(),
                message: format!(
                    "Your oral health analysis report has been reviewed by {}.",
                    request.reviewer.name,
                ),
            });
        }

        tracing::info!(
            analysis_id = %updated.id,
            reviewer = %request.reviewer.name,
            outcome = %request.outcome,
            "review applied"
        );
        Ok(ReviewedAnalysis { analysis: updated, events })
    }

    /// Remove an image and cascade-delete its linked analysis.
    ///
    /// Idempotent by design: deleting an absent id is a no-op, not an error.
    pub fn delete_image(&self, image_id: Uuid) -> Result<DeleteOutcome, WorkflowError> {
        let lock = self.locks.for_image(image_id)?;
        let _guard = lock.lock().map_err(|e| StorageError::Poisoned(e.to_string()))?;

        let mut images: Vec<ImageRecord> = db::load_all(self.store.as_ref(), Collection::Images)?;
        let image_count = images.len();
        images.retain(|img| img.id != image_id);
        let removed_image = images.len() < image_count;

        let mut analyses: Vec<AnalysisRecord> =
            db::load_all(self.store.as_ref(), Collection::Analyses)?;
        let analysis_count = analyses.len();
        analyses.retain(|a| a.image_id != image_id);
        let removed_analysis = analyses.len() < analysis_count;

        if removed_image || removed_analysis {
            self.store.put_all(vec![
                (Collection::Images, db::encode_all(&images)?),
                (Collection::Analyses, db::encode_all(&analyses)?),
            ])?;
            tracing::info!(
                image_id = %image_id,
                cascaded = removed_analysis,
                "image deleted"
            );
        }

        Ok(DeleteOutcome { removed_image, removed_analysis })
    }

    /// All analyses awaiting review: high tier first, then newest first
    /// within tier (medium and low sort together).
    pub fn list_pending_reviews(&self) -> Result<Vec<AnalysisRecord>, WorkflowError> {
        let mut pending: Vec<AnalysisRecord> =
            db::load_all::<AnalysisRecord>(self.store.as_ref(), Collection::Analyses)?
                .into_iter()
                .filter(|a| a.status == AnalysisStatus::PendingReview)
                .collect();

        pending.sort_by(|a, b| {
            let a_high = a.risk_tier == RiskTier::High;
            let b_high = b.risk_tier == RiskTier::High;
            b_high
                .cmp(&a_high)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        Ok(pending)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn image(&self, image_id: Uuid) -> Result<Option<ImageRecord>, WorkflowError> {
        let images: Vec<ImageRecord> = db::load_all(self.store.as_ref(), Collection::Images)?;
        Ok(images.into_iter().find(|img| img.id == image_id))
    }

    pub fn analysis(&self, analysis_id: Uuid) -> Result<Option<AnalysisRecord>, WorkflowError> {
        let analyses: Vec<AnalysisRecord> =
            db::load_all(self.store.as_ref(), Collection::Analyses)?;
        Ok(analyses.into_iter().find(|a| a.id == analysis_id))
    }

    /// A user's images, newest first.
    pub fn images_for_user(&self, user_id: Uuid) -> Result<Vec<ImageRecord>, WorkflowError> {
        let mut images: Vec<ImageRecord> =
            db::load_all::<ImageRecord>(self.store.as_ref(), Collection::Images)?
                .into_iter()
                .filter(|img| img.user_id == user_id)
                .collect();
        images.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(images)
    }

    /// A user's analyses, newest first.
    pub fn analyses_for_user(&self, user_id: Uuid) -> Result<Vec<AnalysisRecord>, WorkflowError> {
        let mut analyses: Vec<AnalysisRecord> =
            db::load_all::<AnalysisRecord>(self.store.as_ref(), Collection::Analyses)?
                .into_iter()
                .filter(|a| a.user_id == user_id)
                .collect();
        analyses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(analyses)
    }

    /// A user's analyses oldest first, shaped for trend analysis.
    pub fn history_for_user(&self, user_id: Uuid) -> Result<Vec<HistoryEntry>, WorkflowError> {
        let mut analyses = self.analyses_for_user(user_id)?;
        analyses.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(analyses.iter().map(HistoryEntry::from).collect())
    }
}

fn find_image_mut(
    images: &mut [ImageRecord],
    image_id: Uuid,
) -> Result<&mut ImageRecord, WorkflowError> {
    images
        .iter_mut()
        .find(|img| img.id == image_id)
        .ok_or_else(|| WorkflowError::NotFound {
            entity: "image",
            id: image_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{AngleCheck, Brightness, FindingCategory, Severity, UserRole};
    use crate::pipeline::quality::compose_result;
    use crate::pipeline::risk;

    fn workflow() -> ReviewWorkflow {
        ReviewWorkflow::new(Arc::new(MemoryStore::new()))
    }

    fn patient() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            name: "Mei Wang".into(),
            role: UserRole::Patient,
        }
    }

    fn clinician() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            name: "Dr. Lin".into(),
            role: UserRole::Clinician,
        }
    }

    fn payload() -> ImagePayload {
        ImagePayload::new("incisor.jpg", vec![0u8; 128])
    }

    fn passing_quality() -> QualityResult {
        compose_result(85, Brightness::Good, AngleCheck::Appropriate)
    }

    fn failing_quality() -> QualityResult {
        compose_result(40, Brightness::TooDark, AngleCheck::Appropriate)
    }

    fn finding(category: FindingCategory, confidence: u8) -> Finding {
        Finding::new(category, confidence, "11 (upper right central incisor)", Severity::Moderate, "x")
    }

    fn high_risk_findings() -> Vec<Finding> {
        vec![
            finding(FindingCategory::Caries, 100),
            finding(FindingCategory::Recession, 100),
            finding(FindingCategory::Caries, 100),
        ]
    }

    fn low_risk_findings() -> Vec<Finding> {
        vec![finding(FindingCategory::Discoloration, 60)]
    }

    /// Drive an upload through quality pass and analysis in one step.
    fn analyzed_record(wf: &ReviewWorkflow, findings: Vec<Finding>) -> RecordedAnalysis {
        let image = wf.register_upload(&patient(), &payload(), "blob/a").unwrap();
        wf.submit_quality(image.id, passing_quality()).unwrap();
        let risk = risk::score(&findings);
        wf.record_analysis(image.id, findings, risk).unwrap()
    }

    #[test]
    fn register_rejects_malformed_payload() {
        let wf = workflow();
        let err = wf
            .register_upload(&patient(), &ImagePayload::new("x.jpg", vec![]), "blob")
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidInput(_)));
    }

    #[test]
    fn quality_pass_and_fail_transition_status() {
        let wf = workflow();

        let passed = wf.register_upload(&patient(), &payload(), "a").unwrap();
        let passed = wf.submit_quality(passed.id, passing_quality()).unwrap();
        assert_eq!(passed.status, ImageStatus::QualityPassed);
        assert!(passed.quality_check.as_ref().unwrap().passed);

        let failed = wf.register_upload(&patient(), &payload(), "b").unwrap();
        let failed = wf.submit_quality(failed.id, failing_quality()).unwrap();
        assert_eq!(failed.status, ImageStatus::QualityFailed);
    }

    #[test]
    fn quality_resubmission_overwrites() {
        let wf = workflow();
        let image = wf.register_upload(&patient(), &payload(), "a").unwrap();

        wf.submit_quality(image.id, failing_quality()).unwrap();
        let updated = wf.submit_quality(image.id, passing_quality()).unwrap();

        assert_eq!(updated.status, ImageStatus::QualityPassed);
        assert_eq!(updated.quality_check.unwrap().clarity, 85);
    }

    #[test]
    fn submit_quality_on_unknown_id_is_not_found() {
        let wf = workflow();
        let err = wf.submit_quality(Uuid::new_v4(), passing_quality()).unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound { entity: "image", .. }));
    }

    #[test]
    fn record_analysis_links_pair_and_transitions() {
        let wf = workflow();
        let recorded = analyzed_record(&wf, low_risk_findings());

        assert_eq!(recorded.image.status, ImageStatus::Analyzed);
        assert_eq!(recorded.image.analysis_id, Some(recorded.analysis.id));
        assert_eq!(recorded.analysis.image_id, recorded.image.id);
        assert_eq!(recorded.analysis.status, AnalysisStatus::PendingReview);
    }

    #[test]
    fn record_analysis_before_quality_pass_is_invalid_state() {
        let wf = workflow();
        let image = wf.register_upload(&patient(), &payload(), "a").unwrap();

        let findings = low_risk_findings();
        let risk = risk::score(&findings);
        let err = wf.record_analysis(image.id, findings, risk).unwrap_err();

        assert!(matches!(err, WorkflowError::InvalidState { operation: "record_analysis", .. }));
        // Record unchanged: still uploaded, still unlinked.
        let image = wf.image(image.id).unwrap().unwrap();
        assert_eq!(image.status, ImageStatus::Uploaded);
        assert!(image.analysis_id.is_none());
    }

    #[test]
    fn record_analysis_on_quality_failed_is_invalid_state() {
        let wf = workflow();
        let image = wf.register_upload(&patient(), &payload(), "a").unwrap();
        wf.submit_quality(image.id, failing_quality()).unwrap();

        let findings = low_risk_findings();
        let risk = risk::score(&findings);
        let err = wf.record_analysis(image.id, findings, risk).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState { .. }));
    }

    #[test]
    fn high_tier_emits_exactly_one_alert() {
        let wf = workflow();
        let recorded = analyzed_record(&wf, high_risk_findings());

        assert_eq!(recorded.analysis.risk_tier, RiskTier::High);
        assert_eq!(recorded.events.len(), 1);
        let event = &recorded.events[0];
        assert_eq!(event.kind, NotificationKind::HighRiskAlert);
        assert_eq!(event.user_id, recorded.analysis.user_id);
        assert_eq!(event.related_id, recorded.analysis.id);
        assert_eq!(event.priority, NotificationPriority::High);
    }

    #[test]
    fn low_tier_emits_nothing() {
        let wf = workflow();
        let recorded = analyzed_record(&wf, low_risk_findings());
        assert_eq!(recorded.analysis.risk_tier, RiskTier::Low);
        assert!(recorded.events.is_empty());
    }

    #[test]
    fn medium_tier_emits_nothing() {
        let wf = workflow();
        // 1.0 * 3 + 0.9 * 3 = 5.7, medium.
        let recorded = analyzed_record(
            &wf,
            vec![
                finding(FindingCategory::Caries, 100),
                finding(FindingCategory::Recession, 90),
            ],
        );
        assert_eq!(recorded.analysis.risk_tier, RiskTier::Medium);
        assert!(recorded.events.is_empty());
    }

    #[test]
    fn reviewed_outcome_emits_completion_event() {
        let wf = workflow();
        let recorded = analyzed_record(&wf, low_risk_findings());
        let reviewer = clinician();

        let reviewed = wf
            .apply_review(ReviewRequest {
                analysis_id: recorded.analysis.id,
                reviewer: reviewer.clone(),
                outcome: ReviewOutcome::Reviewed,
                notes: Some("Looks manageable".into()),
            })
            .unwrap();

        assert_eq!(reviewed.analysis.status, AnalysisStatus::Reviewed);
        assert_eq!(reviewed.analysis.reviewed_by, Some(reviewer.id));
        assert_eq!(reviewed.analysis.reviewer_notes.as_deref(), Some("Looks manageable"));
        assert!(reviewed.analysis.reviewed_at.is_some());

        assert_eq!(reviewed.events.len(), 1);
        assert_eq!(reviewed.events[0].kind, NotificationKind::ReviewCompleted);
        assert_eq!(reviewed.events[0].user_id, recorded.analysis.user_id);
    }

    #[test]
    fn follow_up_outcome_emits_nothing() {
        let wf = workflow();
        let recorded = analyzed_record(&wf, low_risk_findings());

        let reviewed = wf
            .apply_review(ReviewRequest {
                analysis_id: recorded.analysis.id,
                reviewer: clinician(),
                outcome: ReviewOutcome::FollowUpScheduled,
                notes: None,
            })
            .unwrap();

        assert_eq!(reviewed.analysis.status, AnalysisStatus::FollowUpScheduled);
        assert!(reviewed.events.is_empty());
    }

    #[test]
    fn re_review_overwrites_reviewer_fields() {
        let wf = workflow();
        let recorded = analyzed_record(&wf, low_risk_findings());

        wf.apply_review(ReviewRequest {
            analysis_id: recorded.analysis.id,
            reviewer: clinician(),
            outcome: ReviewOutcome::Reviewed,
            notes: Some("first pass".into()),
        })
        .unwrap();

        let second_reviewer = clinician();
        let reviewed = wf
            .apply_review(ReviewRequest {
                analysis_id: recorded.analysis.id,
                reviewer: second_reviewer.clone(),
                outcome: ReviewOutcome::FollowUpScheduled,
                notes: Some("needs follow-up after all".into()),
            })
            .unwrap();

        assert_eq!(reviewed.analysis.reviewed_by, Some(second_reviewer.id));
        assert_eq!(reviewed.analysis.status, AnalysisStatus::FollowUpScheduled);
        assert_eq!(
            reviewed.analysis.reviewer_notes.as_deref(),
            Some("needs follow-up after all")
        );
    }

    #[test]
    fn review_of_unknown_analysis_is_not_found() {
        let wf = workflow();
        let err = wf
            .apply_review(ReviewRequest {
                analysis_id: Uuid::new_v4(),
                reviewer: clinician(),
                outcome: ReviewOutcome::Reviewed,
                notes: None,
            })
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound { entity: "analysis", .. }));
    }

    #[test]
    fn delete_cascades_and_is_idempotent() {
        let wf = workflow();
        let recorded = analyzed_record(&wf, low_risk_findings());
        let image_id = recorded.image.id;

        let first = wf.delete_image(image_id).unwrap();
        assert!(first.removed_image);
        assert!(first.removed_analysis);
        assert!(wf.image(image_id).unwrap().is_none());
        assert!(wf.analysis(recorded.analysis.id).unwrap().is_none());

        let second = wf.delete_image(image_id).unwrap();
        assert!(!second.removed_image);
        assert!(!second.removed_analysis);
    }

    #[test]
    fn delete_of_unanalyzed_image_removes_only_image() {
        let wf = workflow();
        let image = wf.register_upload(&patient(), &payload(), "a").unwrap();

        let outcome = wf.delete_image(image.id).unwrap();
        assert!(outcome.removed_image);
        assert!(!outcome.removed_analysis);
    }

    #[test]
    fn pending_reviews_put_high_tier_first() {
        let wf = workflow();

        // Low-tier analysis created *after* the high-tier one still sorts
        // below it.
        let high = analyzed_record(&wf, high_risk_findings());
        let low = analyzed_record(&wf, low_risk_findings());
        assert!(low.analysis.created_at >= high.analysis.created_at);

        let pending = wf.list_pending_reviews().unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, high.analysis.id);
        assert_eq!(pending[1].id, low.analysis.id);
    }

    #[test]
    fn pending_reviews_exclude_reviewed_records() {
        let wf = workflow();
        let first = analyzed_record(&wf, low_risk_findings());
        let second = analyzed_record(&wf, low_risk_findings());

        wf.apply_review(ReviewRequest {
            analysis_id: first.analysis.id,
            reviewer: clinician(),
            outcome: ReviewOutcome::Reviewed,
            notes: None,
        })
        .unwrap();

        let pending = wf.list_pending_reviews().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, second.analysis.id);
    }

    #[test]
    fn history_is_oldest_first() {
        let wf = workflow();
        let owner = patient();

        for _ in 0..3 {
            let image = wf.register_upload(&owner, &payload(), "a").unwrap();
            wf.submit_quality(image.id, passing_quality()).unwrap();
            let findings = low_risk_findings();
            let risk = risk::score(&findings);
            wf.record_analysis(image.id, findings, risk).unwrap();
        }

        let history = wf.history_for_user(owner.id).unwrap();
        assert_eq!(history.len(), 3);
        assert!(history.windows(2).all(|w| w[0].recorded_at <= w[1].recorded_at));
    }

    #[test]
    fn concurrent_delete_and_analysis_leave_no_orphan() {
        use std::thread;

        for _ in 0..20 {
            let wf = Arc::new(workflow());
            let image = wf.register_upload(&patient(), &payload(), "a").unwrap();
            wf.submit_quality(image.id, passing_quality()).unwrap();
            let image_id = image.id;

            let record_wf = Arc::clone(&wf);
            let recorder = thread::spawn(move || {
                let findings = vec![finding(FindingCategory::Caries, 80)];
                let risk = risk::score(&findings);
                // Either succeeds (before delete) or the image is gone.
                let _ = record_wf.record_analysis(image_id, findings, risk);
            });

            let delete_wf = Arc::clone(&wf);
            let deleter = thread::spawn(move || {
                delete_wf.delete_image(image_id).unwrap();
            });

            recorder.join().unwrap();
            deleter.join().unwrap();

            // Whatever the interleaving, the pair is consistent: if the
            // image survived it is fully linked; if it is gone, no orphan
            // analysis remains.
            wf.delete_image(image_id).unwrap();
            assert!(wf.image(image_id).unwrap().is_none());
            let analyses = wf.analyses_for_user(image.user_id).unwrap();
            assert!(analyses.iter().all(|a| a.image_id != image_id));
        }
    }
}
