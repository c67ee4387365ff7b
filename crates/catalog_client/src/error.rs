use shared::error::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("catalog url '{0}' must use http or https")]
    UnsupportedScheme(String),
    #[error("catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("catalog rejected request ({:?}): {}", .0.code, .0.message)]
    Api(ApiError),
    #[error("catalog unavailable")]
    Unavailable,
}
