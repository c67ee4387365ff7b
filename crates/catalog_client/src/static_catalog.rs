use std::{
    collections::HashMap,
    sync::{Mutex, RwLock},
};

use async_trait::async_trait;
use shared::domain::{PackageHandle, SubscriptionType};

use crate::{CatalogError, CatalogOutcome, SubscriptionCatalog, PRICE_UNAVAILABLE};

struct StaticOffering {
    package: PackageHandle,
    localized_price: String,
}

/// In-memory catalog with fixed offerings and scripted outcomes.
pub struct StaticCatalog {
    offerings: RwLock<HashMap<SubscriptionType, StaticOffering>>,
    purchase_outcome: Mutex<CatalogOutcome>,
    restore_outcome: Mutex<CatalogOutcome>,
    purchases: Mutex<Vec<PackageHandle>>,
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self {
            offerings: RwLock::new(HashMap::new()),
            purchase_outcome: Mutex::new(CatalogOutcome::Succeeded),
            restore_outcome: Mutex::new(CatalogOutcome::Succeeded),
            purchases: Mutex::new(Vec::new()),
        }
    }

    /// Demo offerings for both plan durations.
    pub fn with_demo_offerings(monthly_price: &str, yearly_price: &str) -> Self {
        Self::new()
            .with_package(SubscriptionType::Monthly, monthly_price)
            .with_package(SubscriptionType::Yearly, yearly_price)
    }

    pub fn with_package(self, subscription_type: SubscriptionType, localized_price: &str) -> Self {
        let package = PackageHandle::new(
            format!("${}", subscription_type.as_str()),
            format!("premium_{}", subscription_type.as_str()),
            subscription_type,
        );
        if let Ok(mut offerings) = self.offerings.write() {
            offerings.insert(
                subscription_type,
                StaticOffering {
                    package,
                    localized_price: localized_price.to_string(),
                },
            );
        }
        self
    }

    pub fn with_purchase_outcome(self, outcome: CatalogOutcome) -> Self {
        self.set_purchase_outcome(outcome);
        self
    }

    pub fn with_restore_outcome(self, outcome: CatalogOutcome) -> Self {
        if let Ok(mut slot) = self.restore_outcome.lock() {
            *slot = outcome;
        }
        self
    }

    pub fn set_purchase_outcome(&self, outcome: CatalogOutcome) {
        if let Ok(mut slot) = self.purchase_outcome.lock() {
            *slot = outcome;
        }
    }

    /// Packages passed to `purchase_package`, oldest first.
    pub fn purchases(&self) -> Vec<PackageHandle> {
        self.purchases
            .lock()
            .map(|purchases| purchases.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SubscriptionCatalog for StaticCatalog {
    fn localized_price(&self, subscription_type: SubscriptionType) -> String {
        self.offerings
            .read()
            .ok()
            .and_then(|offerings| {
                offerings
                    .get(&subscription_type)
                    .map(|offering| offering.localized_price.clone())
            })
            .unwrap_or_else(|| PRICE_UNAVAILABLE.to_string())
    }

    fn package(&self, subscription_type: SubscriptionType) -> Option<PackageHandle> {
        self.offerings.read().ok().and_then(|offerings| {
            offerings
                .get(&subscription_type)
                .map(|offering| offering.package.clone())
        })
    }

    async fn refresh_offerings(&self) -> Result<(), CatalogError> {
        Ok(())
    }

    async fn purchase_package(&self, package: &PackageHandle) -> CatalogOutcome {
        if let Ok(mut purchases) = self.purchases.lock() {
            purchases.push(package.clone());
        }
        self.purchase_outcome
            .lock()
            .map(|outcome| outcome.clone())
            .unwrap_or_else(|_| CatalogOutcome::Failed { message: None })
    }

    async fn restore_purchases(&self) -> CatalogOutcome {
        self.restore_outcome
            .lock()
            .map(|outcome| outcome.clone())
            .unwrap_or_else(|_| CatalogOutcome::Failed { message: None })
    }
}
