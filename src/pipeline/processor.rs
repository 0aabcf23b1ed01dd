//! Screening orchestrator.
//!
//! Single entry point that drives the full pass for one upload:
//! register → quality gate → (if passed) detection → scoring → workflow.
//!
//! Gate and detector stand in for latency-bearing inference, so both run via
//! `spawn_blocking` with their results fed back into the workflow. There is
//! no cancellation: an abandoned call may still complete and update state,
//! which is safe because the stages are idempotent-by-overwrite.

use std::sync::Arc;

use uuid::Uuid;

use super::detector::AnomalyDetector;
use super::error::WorkflowError;
use super::quality::QualityGate;
use super::risk;
use crate::models::{Identity, ImagePayload, QualityResult, RiskTier};
use crate::notify::NotificationDispatcher;
use crate::workflow::{ReviewRequest, ReviewWorkflow, ReviewedAnalysis};

/// Summary of a recorded analysis, for callers that don't need the full
/// record.
#[derive(Debug, Clone)]
pub struct AnalysisSummary {
    pub analysis_id: Uuid,
    pub risk_score: f64,
    pub risk_tier: RiskTier,
    pub finding_count: usize,
}

/// What happened to one upload. `analysis` is None when the quality gate
/// rejected the image.
#[derive(Debug, Clone)]
pub struct ScreeningOutcome {
    pub image_id: Uuid,
    pub quality: QualityResult,
    pub analysis: Option<AnalysisSummary>,
}

pub struct ScreeningProcessor {
    gate: Arc<dyn QualityGate>,
    detector: Arc<dyn AnomalyDetector>,
    workflow: Arc<ReviewWorkflow>,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl ScreeningProcessor {
    pub fn new(
        gate: Arc<dyn QualityGate>,
        detector: Arc<dyn AnomalyDetector>,
        workflow: Arc<ReviewWorkflow>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self { gate, detector, workflow, dispatcher }
    }

    /// Full pass for one upload.
    ///
    /// 1. Register the image record
    /// 2. Quality gate (off-executor) → submit verdict
    /// 3. If rejected → outcome without analysis
    /// 4. Detection (off-executor) → score → record analysis
    /// 5. Forward emitted events to the dispatcher
    pub async fn process_upload(
        &self,
        submitter: &Identity,
        payload: ImagePayload,
        payload_ref: impl Into<String>,
    ) -> Result<ScreeningOutcome, WorkflowError> {
        let image = self
            .workflow
            .register_upload(submitter, &payload, payload_ref)?;
        let payload = Arc::new(payload);

        let gate = Arc::clone(&self.gate);
        let gate_input = Arc::clone(&payload);
        let quality = tokio::task::spawn_blocking(move || gate.evaluate(&gate_input))
            .await
            .map_err(|e| WorkflowError::StageFailed(e.to_string()))??;

        let image = self.workflow.submit_quality(image.id, quality.clone())?;
        if !quality.passed {
            tracing::info!(image_id = %image.id, "upload rejected by quality gate");
            return Ok(ScreeningOutcome { image_id: image.id, quality, analysis: None });
        }

        let detector = Arc::clone(&self.detector);
        let detect_input = Arc::clone(&payload);
        let findings = tokio::task::spawn_blocking(move || detector.detect(&detect_input))
            .await
            .map_err(|e| WorkflowError::StageFailed(e.to_string()))??;

        let risk = risk::score(&findings);
        let recorded = self.workflow.record_analysis(image.id, findings, risk)?;
        for event in &recorded.events {
            self.dispatcher.emit(event);
        }

        Ok(ScreeningOutcome {
            image_id: image.id,
            quality,
            analysis: Some(AnalysisSummary {
                analysis_id: recorded.analysis.id,
                risk_score: recorded.analysis.risk_score,
                risk_tier: recorded.analysis.risk_tier,
                finding_count: recorded.analysis.findings.len(),
            }),
        })
    }

    /// Apply a review and forward its events to the dispatcher.
    pub fn apply_review(&self, request: ReviewRequest) -> Result<ReviewedAnalysis, WorkflowError> {
        let reviewed = self.workflow.apply_review(request)?;
        for event in &reviewed.events {
            self.dispatcher.emit(event);
        }
        Ok(reviewed)
    }
}
