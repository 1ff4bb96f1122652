use crate::domain::model::Allowlist;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn store_key(&self) -> &str;
    fn allowlist(&self) -> Allowlist;
    fn venue_url_template(&self) -> &str;
}

/// Why a visitor call did not produce a store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct VisitError {
    pub reason: String,
}

impl VisitError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// 場館造訪能力：由瀏覽器自動化層提供
///
/// Both calls act on the same page, so a visitor is borrowed mutably for the
/// whole aggregation pass and venues are visited one at a time.
#[async_trait]
pub trait VenueVisitor: Send {
    /// Load the venue page for `slug` and wait until it is ready.
    async fn navigate(&mut self, slug: &str) -> std::result::Result<(), VisitError>;

    /// Read the serialized client-side store of the page last navigated to.
    /// `Ok(None)` means the page has no store under the configured key.
    async fn read_serialized_store(&mut self) -> std::result::Result<Option<String>, VisitError>;
}
