//! Client for Apple's Wi-Fi location service.

use crate::api::wloc::{WlocRequest, WlocResponse};
use crate::api::{HttpTransport, LocationProvider};
use crate::config::AppleConfig;
use crate::error::{AppError, Result};
use crate::models::{Bssid, Coordinate, Provider};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

const CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// An asynchronous client for Apple's `wloc` Wi-Fi location service.
pub struct AppleClient {
    config: AppleConfig,
    transport: Arc<dyn HttpTransport>,
}

impl AppleClient {
    /// Creates a new `AppleClient` that sends through `transport`.
    ///
    /// The locale, client id and OS version in `config` are written into every request.
    pub fn new(config: AppleConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }
}

#[async_trait]
impl LocationProvider for AppleClient {
    fn provider(&self) -> Provider {
        Provider::Apple
    }

    /// Looks `bssid` up and returns the position of the first access point the
    /// service reports.
    async fn query(&self, bssid: &Bssid) -> Result<Coordinate> {
        let payload = WlocRequest {
            locale: &self.config.locale,
            client_id: &self.config.client_id,
            os_version: &self.config.os_version,
            bssid: bssid.as_str(),
        }
        .encode()?;
        debug!(octets = ?bssid.octets(), "Encoded {} byte wloc request", payload.len());

        let response = self
            .transport
            .post(&self.config.endpoint, CONTENT_TYPE, payload)
            .await?;
        debug!("Apple answered HTTP {}", response.status);

        // The body is decoded whatever the status; a status only explains a body
        // that yields nothing.
        let decoded = match WlocResponse::decode(&response.body) {
            Ok(decoded) => decoded,
            Err(_) if !response.is_success() => return Err(AppError::HttpStatus(response.status)),
            Err(e) => return Err(e.into()),
        };
        debug!("wloc response lists {} access points", decoded.devices.len());

        let device = match decoded.devices.first() {
            Some(device) => device,
            None if !response.is_success() => return Err(AppError::HttpStatus(response.status)),
            None => return Err(AppError::NoLocation),
        };
        info!(
            "Apple located {} (reported as {}, accuracy {:?})",
            bssid, device.bssid, device.location.accuracy
        );

        Ok(Coordinate {
            latitude: device.location.latitude_degrees(),
            longitude: device.location.longitude_degrees(),
        })
    }
}
