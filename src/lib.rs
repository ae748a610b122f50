//! Vitalgauge - Data quality and device reliability engine for health readings
//!
//! Vitalgauge turns a stream of timestamped health readings from multiple
//! sources into an explainable quality report through a deterministic
//! pipeline: outlier classification → quality scoring → device reliability
//! assessment → conflict detection → report aggregation.
//!
//! ## Entry points
//!
//! - **Report generation**: score a user's full reading history for a window
//! - **Single-reading validation**: synchronous accept/reject at ingestion
//! - **Score presentation**: badge lookup for rendering a 0-100 score

pub mod conflict;
pub mod device;
pub mod engine;
pub mod error;
pub mod outlier;
pub mod policy;
pub mod quality;
pub mod ranges;
pub mod report;
mod stats;
pub mod types;

pub use engine::{MemoryStore, QualityEngine, ReadingStore, DEFAULT_WINDOW_DAYS};
pub use error::EngineError;
pub use policy::EnginePolicy;
pub use quality::describe_score;
pub use report::ReportBuilder;
pub use types::{
    AnalysisWindow, AnomalyKind, AnomalyRecord, Conflict, DeviceProfile, QualityScore, Reading,
    ReadingValidation, ReliabilityTier, Report, ScoreBadge, Severity,
};

/// Engine version embedded in every report
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
