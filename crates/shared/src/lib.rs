//! Domain types shared by the catalog client and the paywall app.

pub mod domain;
pub mod error;
pub mod offer;
pub mod protocol;
