//! Errors raised while driving a page over the DevTools protocol.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    /// No usable page target was advertised by the DevTools HTTP endpoint.
    #[error("no page target found at {endpoint}")]
    NoPageTarget { endpoint: String },

    #[error("DevTools discovery failed: {0}")]
    Discovery(#[from] reqwest::Error),

    #[error("failed to connect to DevTools at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("CDP error {code}: {message}")]
    Cdp { code: i64, message: String },

    #[error("CDP command '{method}' timed out after {duration:?}")]
    Timeout { method: String, duration: Duration },

    #[error("CDP protocol error: {detail}")]
    Protocol { detail: String },

    #[error("navigation failed: {reason}")]
    NavigationFailed { reason: String },

    #[error("page load timed out after {duration:?}")]
    PageLoadTimeout { duration: Duration },

    #[error("JavaScript exception: {message}")]
    JsException { message: String },
}
