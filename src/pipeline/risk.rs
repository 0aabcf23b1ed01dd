//! Risk scoring — weighted aggregation of findings into a score and tier.
//!
//! Pure and deterministic: the same finding list always produces the same
//! score and tier. All presentation attributes of a tier live in a static
//! lookup table, not in logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Finding, FindingCategory, RiskTier};

/// Tier boundaries on the aggregate score.
pub mod risk_thresholds {
    /// Score at or above this is high risk.
    pub const HIGH: f64 = 8.0;
    /// Score at or above this (and below HIGH) is medium risk.
    pub const MEDIUM: f64 = 5.0;
}

/// Fixed severity weight per finding category.
pub fn category_weight(category: FindingCategory) -> f64 {
    match category {
        FindingCategory::Caries | FindingCategory::Recession => 3.0,
        FindingCategory::Gingivitis | FindingCategory::Calculus => 2.0,
        FindingCategory::Discoloration | FindingCategory::Other => 1.0,
    }
}

/// One finding's share of the aggregate score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindingContribution {
    pub category: FindingCategory,
    pub confidence: u8,
    pub weight: f64,
    /// (confidence / 100) x weight, rounded to one decimal.
    pub contribution: f64,
}

/// Aggregate risk assessment over one finding list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskResult {
    /// Sum of contributions, rounded to one decimal place.
    pub score: f64,
    pub tier: RiskTier,
    pub finding_count: usize,
    /// Counts by *weight class* (3/2/1), not by computed tier: a
    /// low-confidence caries finding still counts as high-weight. Downstream
    /// display depends on this shape.
    pub high_weight_count: usize,
    pub medium_weight_count: usize,
    pub low_weight_count: usize,
    pub recommendation: String,
    pub contributions: Vec<FindingContribution>,
    pub scored_at: DateTime<Utc>,
}

/// Static presentation attributes of a tier.
#[derive(Debug, Clone, Copy)]
pub struct TierProfile {
    pub tier: RiskTier,
    pub label: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
    pub recommendation: &'static str,
}

const LOW_PROFILE: TierProfile = TierProfile {
    tier: RiskTier::Low,
    label: "Low risk",
    color: "#10B981",
    icon: "✅",
    recommendation: "No significant anomalies found. Keep up your oral hygiene \
                     routine and schedule a routine check every 3 months.",
};

const MEDIUM_PROFILE: TierProfile = TierProfile {
    tier: RiskTier::Medium,
    label: "Medium risk",
    color: "#F59E0B",
    icon: "🟠",
    recommendation: "Some conditions need attention. Step up your oral cleaning \
                     and arrange a follow-up check within a week.",
};

const HIGH_PROFILE: TierProfile = TierProfile {
    tier: RiskTier::High,
    label: "High risk",
    color: "#EF4444",
    icon: "🔴",
    recommendation: "Serious anomaly signs detected. Book a dental examination \
                     as soon as possible to avoid delaying treatment.",
};

impl RiskTier {
    pub fn profile(&self) -> &'static TierProfile {
        match self {
            Self::Low => &LOW_PROFILE,
            Self::Medium => &MEDIUM_PROFILE,
            Self::High => &HIGH_PROFILE,
        }
    }
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Score a finding list.
///
/// Empty input is not an error: it scores 0.0 and lands in the low tier.
pub fn score(findings: &[Finding]) -> RiskResult {
    let mut total = 0.0;
    let mut contributions = Vec::with_capacity(findings.len());

    for finding in findings {
        let weight = category_weight(finding.category);
        let contribution = f64::from(finding.confidence) / 100.0 * weight;
        total += contribution;

        contributions.push(FindingContribution {
            category: finding.category,
            confidence: finding.confidence,
            weight,
            contribution: round1(contribution),
        });
    }

    let total = round1(total);
    let tier = if total >= risk_thresholds::HIGH {
        RiskTier::High
    } else if total >= risk_thresholds::MEDIUM {
        RiskTier::Medium
    } else {
        RiskTier::Low
    };

    let count_by_weight = |weight: f64| {
        findings
            .iter()
            .filter(|f| category_weight(f.category) == weight)
            .count()
    };

    RiskResult {
        score: total,
        tier,
        finding_count: findings.len(),
        high_weight_count: count_by_weight(3.0),
        medium_weight_count: count_by_weight(2.0),
        low_weight_count: count_by_weight(1.0),
        recommendation: tier.profile().recommendation.to_string(),
        contributions,
        scored_at: Utc::now(),
    }
}

/// Urgency of a risk alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Immediate,
    Soon,
    Routine,
}

/// Per-tier alert template for surfacing a risk result to the user.
#[derive(Debug, Clone, Serialize)]
pub struct RiskAlert {
    pub title: String,
    pub message: String,
    pub action: &'static str,
    pub urgency: Urgency,
}

pub fn alert_for(risk: &RiskResult) -> RiskAlert {
    match risk.tier {
        RiskTier::High => RiskAlert {
            title: "High-risk anomaly detected".to_string(),
            message: format!(
                "Your oral health score is {} (high risk); {} anomalies were detected. {}",
                risk.score, risk.finding_count, risk.recommendation
            ),
            action: "Book now",
            urgency: Urgency::Immediate,
        },
        RiskTier::Medium => RiskAlert {
            title: "Attention needed".to_string(),
            message: format!(
                "Your oral health score is {} (medium risk); {} conditions need watching. {}",
                risk.score, risk.finding_count, risk.recommendation
            ),
            action: "View details",
            urgency: Urgency::Soon,
        },
        RiskTier::Low => RiskAlert {
            title: "Oral health looks good".to_string(),
            message: format!(
                "Your oral health score is {} (low risk). {}",
                risk.score, risk.recommendation
            ),
            action: "View report",
            urgency: Urgency::Routine,
        },
    }
}
