pub mod detector;
pub mod error;
pub mod processor;
pub mod quality;
pub mod risk;
pub mod trend;

pub use detector::{AnomalyDetector, DetectorConfig, FixtureDetector, SimulatedDetector};
pub use error::WorkflowError;
pub use processor::{AnalysisSummary, ScreeningOutcome, ScreeningProcessor};
pub use quality::{FixedQualityGate, QualityGate, SimulatedQualityConfig, SimulatedQualityGate};
pub use risk::{alert_for, category_weight, score, RiskAlert, RiskResult};
pub use trend::{analyze_trend, chart_series, ChartSeries, HistoryEntry, TrendReport};
