pub mod orchestrator;
pub mod trace;

pub use orchestrator::{ScanResponse, ScanService};
pub use trace::{ScanMeta, ScanTrace, Stage, StageStatus, StepKind};
