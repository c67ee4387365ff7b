//! JSON bodies exchanged with the catalog service.

use serde::{Deserialize, Serialize};

use crate::domain::{PackageHandle, SubscriptionType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSummary {
    pub identifier: String,
    pub product_id: String,
    pub subscription_type: SubscriptionType,
    pub localized_price: String,
}

impl PackageSummary {
    pub fn handle(&self) -> PackageHandle {
        PackageHandle::new(
            self.identifier.clone(),
            self.product_id.clone(),
            self.subscription_type,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferingsResponse {
    pub packages: Vec<PackageSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub package_identifier: String,
    pub product_id: String,
}

impl From<&PackageHandle> for PurchaseRequest {
    fn from(package: &PackageHandle) -> Self {
        Self {
            package_identifier: package.identifier.clone(),
            product_id: package.product_id.clone(),
        }
    }
}

/// Result of a purchase or restore call, mirroring the store callback shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}
