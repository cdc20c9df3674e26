//! Dataset curation: record normalization, move-history deduplication and
//! multi-view export of mined positions.

pub mod dedup;
pub mod error;
pub mod export;
pub mod normalize;
pub mod on_disk;
pub mod record;
pub mod tier;

pub use dedup::{dedup, DedupKey, Deduplicated};
pub use error::DatasetError;
pub use export::{ExportFormat, ExportReport, View};
pub use normalize::normalize;
pub use on_disk::{DedupTarget, FileDedupReport};
pub use record::{assign_ids, CanonicalRecord, NormalizedRecord, PositionRecord};
pub use tier::Tier;
