pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, Settings};

pub use adapters::{BrowserVenueVisitor, SnapshotVisitor};
pub use crate::core::{
    aggregator::{aggregate, AggregationReport, SeedStatus, VisitFailure, VisitReport, VisitStatus},
    engine::CaptureEngine,
    filter::filter_store,
    merge::merge_keyed,
    planner::plan_missing_visits,
    record_sync::{enrich_capture_record, sync_store_into_record, AggregationPolicy},
    slug::derive_slug,
};
pub use domain::model::{AggregateStore, Allowlist, CaptureRecord, TokenEntry};
pub use domain::ports::{VenueVisitor, VisitError};
pub use utils::error::{CaptureError, Result};
