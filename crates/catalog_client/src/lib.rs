use async_trait::async_trait;
use shared::domain::{PackageHandle, SubscriptionType};

pub mod error;
mod http_catalog;
mod static_catalog;

pub use error::CatalogError;
pub use http_catalog::HttpCatalog;
pub use static_catalog::StaticCatalog;

/// Price shown when the catalog has no offering loaded for a type.
pub const PRICE_UNAVAILABLE: &str = "N/A";

/// Outcome of a purchase or restore call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogOutcome {
    Succeeded,
    Failed { message: Option<String> },
}

impl CatalogOutcome {
    /// Maps a store-style `(success, message)` callback onto an outcome.
    pub fn from_callback(success: bool, message: Option<String>) -> Self {
        if success {
            CatalogOutcome::Succeeded
        } else {
            CatalogOutcome::Failed { message }
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        CatalogOutcome::Failed {
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CatalogOutcome::Succeeded)
    }
}

/// Subscription-management collaborator the purchase flow delegates to.
///
/// Price and package lookups are synchronous reads of whatever offerings the
/// catalog currently holds; `refresh_offerings` repopulates them. Purchase and
/// restore calls have no timeout and resolve whenever the backing store does.
#[async_trait]
pub trait SubscriptionCatalog: Send + Sync {
    fn localized_price(&self, subscription_type: SubscriptionType) -> String;
    fn package(&self, subscription_type: SubscriptionType) -> Option<PackageHandle>;
    async fn refresh_offerings(&self) -> Result<(), CatalogError>;
    async fn purchase_package(&self, package: &PackageHandle) -> CatalogOutcome;
    async fn restore_purchases(&self) -> CatalogOutcome;
}

/// Catalog with nothing configured; every plan is unavailable.
pub struct MissingCatalog;

#[async_trait]
impl SubscriptionCatalog for MissingCatalog {
    fn localized_price(&self, _subscription_type: SubscriptionType) -> String {
        PRICE_UNAVAILABLE.to_string()
    }

    fn package(&self, _subscription_type: SubscriptionType) -> Option<PackageHandle> {
        None
    }

    async fn refresh_offerings(&self) -> Result<(), CatalogError> {
        Err(CatalogError::Unavailable)
    }

    async fn purchase_package(&self, _package: &PackageHandle) -> CatalogOutcome {
        CatalogOutcome::failed("catalog unavailable")
    }

    async fn restore_purchases(&self) -> CatalogOutcome {
        CatalogOutcome::failed("catalog unavailable")
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
