//! DevTools-protocol backed [`VenueVisitor`](crate::domain::ports::VenueVisitor).
//!
//! The browser must already be running with `--remote-debugging-port`; the
//! visitor attaches to its first page target and reuses it for every venue.

pub mod cdp;
pub mod error;
pub mod visitor;

pub use error::BrowserError;
pub use visitor::{BrowserOptions, BrowserVenueVisitor};
