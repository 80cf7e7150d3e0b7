//! Provides clients and utilities for interacting with the geolocation services.
//!
//! Includes:
//! - `apple`: Client for Apple's binary `wloc` service.
//! - `google`: Client for the Google Geolocation JSON API.
//! - `transport`: The HTTP seam both clients send through.
//! - `wloc`: Wire codec for the Apple protocol.

mod apple;
mod google;
#[cfg(test)]
pub(crate) mod mock;
mod transport;
pub mod wloc;

pub use apple::*;
pub use google::*;
pub use transport::*;
pub use wloc::WireError;

use crate::error::Result;
use crate::models::{Bssid, Coordinate, Provider, QueryResult};
use async_trait::async_trait;
use tracing::warn;

/// A geolocation service that can resolve a single BSSID.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    fn provider(&self) -> Provider;

    /// Performs the lookup, propagating any failure.
    async fn query(&self, bssid: &Bssid) -> Result<Coordinate>;

    /// Performs the lookup and folds any failure into the returned record.
    async fn locate(&self, bssid: &Bssid) -> QueryResult {
        let provider = self.provider();
        match self.query(bssid).await {
            Ok(coordinate) => QueryResult::success(provider, bssid.clone(), coordinate),
            Err(e) => {
                warn!("{} lookup for {} failed: {}", provider, bssid, e);
                QueryResult::failure(provider, bssid.clone(), e)
            },
        }
    }
}
