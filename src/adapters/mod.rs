// Adapters layer: concrete VenueVisitor implementations.

pub mod browser;
pub mod snapshot;

pub use browser::BrowserVenueVisitor;
pub use snapshot::SnapshotVisitor;
