pub mod changes;
pub mod classification;
pub mod delta;
pub mod randomness;
pub mod report;

pub use changes::{Change, Delta};
pub use classification::{calculate_classification, Classification, ClassificationResult, Impact};
pub use delta::{compute_delta, DeltaOutcome};
pub use randomness::DisplayRandom;
pub use report::Report;
