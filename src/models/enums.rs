use crate::db::StorageError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = StorageError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(StorageError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

str_enum!(UserRole {
    Patient => "patient",
    Clinician => "clinician",
});

str_enum!(ImageStatus {
    Uploaded => "uploaded",
    QualityPassed => "quality_passed",
    QualityFailed => "quality_failed",
    Analyzed => "analyzed",
});

str_enum!(AnalysisStatus {
    PendingReview => "pending_review",
    Reviewed => "reviewed",
    FollowUpScheduled => "follow_up_scheduled",
});

/// Terminal outcomes a reviewer can assign to an analysis.
str_enum!(ReviewOutcome {
    Reviewed => "reviewed",
    FollowUpScheduled => "follow_up_scheduled",
});

impl From<ReviewOutcome> for AnalysisStatus {
    fn from(outcome: ReviewOutcome) -> Self {
        match outcome {
            ReviewOutcome::Reviewed => Self::Reviewed,
            ReviewOutcome::FollowUpScheduled => Self::FollowUpScheduled,
        }
    }
}

str_enum!(RiskTier {
    Low => "low",
    Medium => "medium",
    High => "high",
});

str_enum!(FindingCategory {
    Caries => "caries",
    Calculus => "calculus",
    Gingivitis => "gingivitis",
    Discoloration => "discoloration",
    Recession => "recession",
    Other => "other",
});

str_enum!(Severity {
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
});

str_enum!(Brightness {
    TooDark => "too_dark",
    Good => "good",
    TooBright => "too_bright",
});

str_enum!(AngleCheck {
    Appropriate => "appropriate",
    NeedsAdjustment => "needs_adjustment",
});

str_enum!(Trend {
    Improving => "improving",
    Stable => "stable",
    Worsening => "worsening",
    InsufficientData => "insufficient_data",
});

str_enum!(NotificationKind {
    HighRiskAlert => "high_risk_alert",
    ReviewCompleted => "review_completed",
    AppointmentBooked => "appointment_booked",
});

str_enum!(NotificationPriority {
    High => "high",
    Medium => "medium",
    Low => "low",
});

str_enum!(AppointmentStatus {
    Confirmed => "confirmed",
    Completed => "completed",
    Cancelled => "cancelled",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn image_status_roundtrip() {
        for status in [
            ImageStatus::Uploaded,
            ImageStatus::QualityPassed,
            ImageStatus::QualityFailed,
            ImageStatus::Analyzed,
        ] {
            let parsed = ImageStatus::from_str(status.as_str()).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn unknown_value_is_rejected() {
        let err = RiskTier::from_str("critical").unwrap_err();
        assert!(matches!(err, StorageError::InvalidEnum { .. }));
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&AnalysisStatus::PendingReview).unwrap();
        assert_eq!(json, "\"pending_review\"");
        let json = serde_json::to_string(&Brightness::TooDark).unwrap();
        assert_eq!(json, "\"too_dark\"");
    }

    #[test]
    fn review_outcome_maps_to_analysis_status() {
        assert_eq!(
            AnalysisStatus::from(ReviewOutcome::Reviewed),
            AnalysisStatus::Reviewed
        );
        assert_eq!(
            AnalysisStatus::from(ReviewOutcome::FollowUpScheduled),
            AnalysisStatus::FollowUpScheduled
        );
    }

    #[test]
    fn finding_category_display() {
        assert_eq!(FindingCategory::Caries.to_string(), "caries");
        assert_eq!(FindingCategory::Discoloration.to_string(), "discoloration");
    }
}
