pub mod extractor;
pub mod fetcher;
pub mod models;
pub mod patterns;
pub mod render;
pub mod urls;

pub use extractor::extract;
pub use fetcher::{HttpPageFetcher, PageSource};
pub use models::{PricingTier, Snapshot, SnapshotSource};
pub use render::{HttpRenderClient, Navigation, PageRenderer};
