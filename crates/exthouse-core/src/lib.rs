pub mod auditor;
pub mod config;
pub mod engine;
pub mod errors;
pub mod extension;
pub mod metrics;
pub mod model;
pub mod report;
pub mod storage;

pub use auditor::{AuditTarget, Auditor};
pub use config::{load_config, MeasureConfig};
pub use engine::runner::{measure, Runner};
pub use errors::ExthouseError;
pub use model::{Extension, ImpactReport, RepresentativeResult, Sample};
pub use report::{assemble, BatchReport};
pub use storage::SampleStore;
