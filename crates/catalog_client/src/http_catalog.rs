use std::{collections::HashMap, sync::RwLock};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use shared::{
    domain::{PackageHandle, SubscriptionType},
    error::ApiError,
    protocol::{CallbackResponse, OfferingsResponse, PackageSummary, PurchaseRequest},
};
use tracing::{info, warn};
use url::Url;

use crate::{CatalogError, CatalogOutcome, SubscriptionCatalog, PRICE_UNAVAILABLE};

/// Catalog backed by a REST subscription service.
///
/// Offerings fetched by `refresh_offerings` are cached so price and package
/// lookups never touch the network.
pub struct HttpCatalog {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    offerings: RwLock<HashMap<SubscriptionType, PackageSummary>>,
}

impl HttpCatalog {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, CatalogError> {
        let parsed = Url::parse(base_url.trim()).map_err(|source| CatalogError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CatalogError::UnsupportedScheme(base_url.to_string()));
        }

        Ok(Self {
            http: Client::new(),
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            offerings: RwLock::new(HashMap::new()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn fetch_offerings(&self) -> Result<OfferingsResponse, CatalogError> {
        let res = self
            .authorized(self.http.get(format!("{}/offerings", self.base_url)))
            .send()
            .await?;
        let res = reject_api_error(res).await?;
        Ok(res.json().await?)
    }

    async fn post_callback(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> Result<CallbackResponse, CatalogError> {
        let res = self.authorized(request).send().await?;
        let res = reject_api_error(res).await?;
        let body: CallbackResponse = res.json().await?;
        info!(path, success = body.success, "catalog callback resolved");
        Ok(body)
    }
}

async fn reject_api_error(res: Response) -> Result<Response, CatalogError> {
    if res.status().is_success() {
        return Ok(res);
    }
    let status = res.status();
    match res.json::<ApiError>().await {
        Ok(api_error) => Err(CatalogError::Api(api_error)),
        Err(err) => {
            warn!(%status, "catalog error response had no readable body: {err}");
            Err(CatalogError::Transport(err))
        }
    }
}

fn outcome_from(result: Result<CallbackResponse, CatalogError>, operation: &str) -> CatalogOutcome {
    match result {
        Ok(body) => CatalogOutcome::from_callback(body.success, body.message),
        Err(CatalogError::Api(api_error)) => CatalogOutcome::Failed {
            message: Some(api_error.message),
        },
        Err(err) => {
            warn!(operation, "catalog call failed: {err}");
            CatalogOutcome::Failed { message: None }
        }
    }
}

#[async_trait]
impl SubscriptionCatalog for HttpCatalog {
    fn localized_price(&self, subscription_type: SubscriptionType) -> String {
        self.offerings
            .read()
            .ok()
            .and_then(|offerings| {
                offerings
                    .get(&subscription_type)
                    .map(|summary| summary.localized_price.clone())
            })
            .unwrap_or_else(|| PRICE_UNAVAILABLE.to_string())
    }

    fn package(&self, subscription_type: SubscriptionType) -> Option<PackageHandle> {
        self.offerings
            .read()
            .ok()
            .and_then(|offerings| offerings.get(&subscription_type).map(PackageSummary::handle))
    }

    async fn refresh_offerings(&self) -> Result<(), CatalogError> {
        let response = self.fetch_offerings().await?;
        let offerings: HashMap<_, _> = response
            .packages
            .into_iter()
            .map(|summary| (summary.subscription_type, summary))
            .collect();
        info!(count = offerings.len(), "catalog offerings refreshed");
        if let Ok(mut cache) = self.offerings.write() {
            *cache = offerings;
        }
        Ok(())
    }

    async fn purchase_package(&self, package: &PackageHandle) -> CatalogOutcome {
        let request = self
            .http
            .post(format!("{}/purchases", self.base_url))
            .json(&PurchaseRequest::from(package));
        outcome_from(self.post_callback("purchases", request).await, "purchase")
    }

    async fn restore_purchases(&self) -> CatalogOutcome {
        let request = self.http.post(format!("{}/restore", self.base_url));
        outcome_from(self.post_callback("restore", request).await, "restore")
    }
}
