pub mod aggregator;
pub mod engine;
pub mod filter;
pub mod merge;
pub mod planner;
pub mod record_sync;
pub mod slug;

pub use crate::domain::model::{AggregateStore, Allowlist, CaptureRecord};
pub use crate::domain::ports::{ConfigProvider, Storage, VenueVisitor, VisitError};
pub use crate::utils::error::Result;
