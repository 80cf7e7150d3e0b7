//! Client for the Google Geolocation API.

use crate::api::{HttpTransport, LocationProvider};
use crate::config::GoogleConfig;
use crate::error::{AppError, Result};
use crate::models::{Bssid, Coordinate, Provider};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

const CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeolocateRequest<'a> {
    consider_ip: bool,
    wifi_access_points: Vec<WifiAccessPoint<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WifiAccessPoint<'a> {
    mac_address: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GeolocateResponse {
    #[serde(default)]
    location: Option<LatLng>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

/// A missing coordinate decodes as zero, like any other absent number in the reply.
#[derive(Debug, Deserialize)]
struct LatLng {
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lng: f64,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// An asynchronous client for the Google Geolocation API.
///
/// Every query also lists the configured fallback access point alongside the one
/// being looked up.
pub struct GoogleClient {
    config: GoogleConfig,
    transport: Arc<dyn HttpTransport>,
}

impl GoogleClient {
    /// Creates a new `GoogleClient` that sends through `transport`.
    ///
    /// A missing API key is accepted here and reported by each lookup instead.
    pub fn new(config: GoogleConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    fn request_body(&self, bssid: &Bssid) -> Result<Bytes> {
        let request = GeolocateRequest {
            consider_ip: false,
            wifi_access_points: vec![
                WifiAccessPoint {
                    mac_address: bssid.as_str(),
                },
                WifiAccessPoint {
                    mac_address: &self.config.fallback_bssid,
                },
            ],
        };
        Ok(serde_json::to_vec(&request)?.into())
    }

    fn request_url(&self, api_key: &str) -> Result<String> {
        let url = Url::parse_with_params(&self.config.endpoint, &[("key", api_key)])
            .map_err(|e| AppError::Config(format!("invalid Google endpoint: {}", e)))?;
        Ok(url.into())
    }
}

#[async_trait]
impl LocationProvider for GoogleClient {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    async fn query(&self, bssid: &Bssid) -> Result<Coordinate> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(AppError::MissingApiKey)?;

        let url = self.request_url(api_key)?;
        let body = self.request_body(bssid)?;

        // Errors come back as JSON bodies on 4xx responses, so decode regardless of status.
        let response = self.transport.post(&url, CONTENT_TYPE, body).await?;
        debug!("Google answered HTTP {}", response.status);

        let decoded: GeolocateResponse = serde_json::from_slice(&response.body)?;

        if let Some(message) = decoded.error.map(|e| e.message).filter(|m| !m.is_empty()) {
            return Err(AppError::Upstream(message));
        }

        let location = decoded.location.ok_or(AppError::NoLocation)?;
        info!("Google located {}", bssid);

        Ok(Coordinate {
            latitude: location.lat,
            longitude: location.lng,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::FakeTransport;
    use crate::config::GOOGLE_FALLBACK_BSSID;
    use mockito::Matcher;
    use serde_json::{json, Value};

    fn config(api_key: Option<&str>) -> GoogleConfig {
        GoogleConfig {
            api_key: api_key.map(str::to_string),
            ..GoogleConfig::default()
        }
    }

    fn bssid() -> Bssid {
        "AA:BB:CC:DD:EE:FF".parse().unwrap()
    }

    #[tokio::test]
    async fn missing_key_short_circuits_without_calling_transport() {
        for key in [None, Some("")] {
            let transport = Arc::new(FakeTransport::responding(200, "{}"));
            let client = GoogleClient::new(config(key), transport.clone());

            let result = client.locate(&bssid()).await;

            assert_eq!(result.provider, Provider::Google);
            assert_eq!(result.error().unwrap().to_string(), "API key is required");
            assert_eq!(transport.calls(), 0);
        }
    }

    #[tokio::test]
    async fn decodes_location() {
        let transport = Arc::new(FakeTransport::responding(
            200,
            r#"{"location":{"lat":37.5,"lng":-122.3},"accuracy":20.0}"#,
        ));
        let client = GoogleClient::new(config(Some("k")), transport.clone());

        let result = client.locate(&bssid()).await;

        assert_eq!(
            result.coordinate(),
            Some(Coordinate {
                latitude: 37.5,
                longitude: -122.3
            })
        );
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn upstream_error_message_is_passed_through() {
        let transport = Arc::new(FakeTransport::responding(
            400,
            r#"{"error":{"code":400,"message":"keyInvalid"}}"#,
        ));
        let client = GoogleClient::new(config(Some("k")), transport);

        let result = client.locate(&bssid()).await;
        assert!(matches!(result.error(), Some(AppError::Upstream(m)) if m == "keyInvalid"));
        assert_eq!(result.error().unwrap().to_string(), "keyInvalid");
    }

    #[tokio::test]
    async fn empty_error_message_falls_through_to_location() {
        let transport = Arc::new(FakeTransport::responding(
            200,
            r#"{"error":{"message":""},"location":{"lat":1.0,"lng":2.0}}"#,
        ));
        let client = GoogleClient::new(config(Some("k")), transport);

        let coordinate = client.query(&bssid()).await.unwrap();
        assert_eq!(coordinate.latitude, 1.0);
        assert_eq!(coordinate.longitude, 2.0);
    }

    #[tokio::test]
    async fn neither_location_nor_error_reports_no_location_data() {
        let transport = Arc::new(FakeTransport::responding(200, "{}"));
        let client = GoogleClient::new(config(Some("k")), transport);

        let result = client.locate(&bssid()).await;
        assert_eq!(result.error().unwrap().to_string(), "no location data");
    }

    #[tokio::test]
    async fn partial_location_defaults_missing_coordinate_to_zero() {
        let transport = Arc::new(FakeTransport::responding(200, r#"{"location":{"lat":1.5}}"#));
        let client = GoogleClient::new(config(Some("k")), transport);

        let coordinate = client.query(&bssid()).await.unwrap();
        assert_eq!(coordinate.latitude, 1.5);
        assert_eq!(coordinate.longitude, 0.0);
    }

    #[tokio::test]
    async fn transport_failure_is_reported() {
        let transport = Arc::new(FakeTransport::failing(AppError::Upstream(
            "connection refused".to_string(),
        )));
        let client = GoogleClient::new(config(Some("k")), transport.clone());

        let result = client.locate(&bssid()).await;

        assert_eq!(result.provider, Provider::Google);
        assert_eq!(result.error().unwrap().to_string(), "connection refused");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error() {
        let transport = Arc::new(FakeTransport::responding(502, "<html>bad gateway</html>"));
        let client = GoogleClient::new(config(Some("k")), transport);

        let result = client.locate(&bssid()).await;
        assert!(matches!(result.error(), Some(AppError::JsonParse(_))));
    }

    #[tokio::test]
    async fn request_carries_key_and_both_access_points() {
        let transport = Arc::new(FakeTransport::responding(
            200,
            r#"{"location":{"lat":0.5,"lng":0.25}}"#,
        ));
        let client = GoogleClient::new(config(Some("a key&more")), transport.clone());

        client.query(&bssid()).await.unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.content_type, CONTENT_TYPE);
        let url = Url::parse(&request.url).unwrap();
        let key = url
            .query_pairs()
            .find(|(k, _)| k == "key")
            .map(|(_, v)| v.into_owned());
        assert_eq!(key.as_deref(), Some("a key&more"));

        let body: Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(
            body,
            json!({
                "considerIp": false,
                "wifiAccessPoints": [
                    {"macAddress": "AA:BB:CC:DD:EE:FF"},
                    {"macAddress": GOOGLE_FALLBACK_BSSID},
                ]
            })
        );
    }

    #[tokio::test]
    async fn against_local_http_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/geolocation/v1/geolocate")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_header("content-type", CONTENT_TYPE)
            .match_body(Matcher::PartialJson(json!({"considerIp": false})))
            .with_status(200)
            .with_body(r#"{"location":{"lat":48.8584,"lng":2.2945},"accuracy":30}"#)
            .create_async()
            .await;

        let config = GoogleConfig {
            endpoint: format!("{}/geolocation/v1/geolocate", server.url()),
            api_key: Some("test-key".to_string()),
            ..GoogleConfig::default()
        };
        let transport =
            Arc::new(crate::api::ReqwestTransport::new(std::time::Duration::from_secs(5)).unwrap());
        let coordinate = GoogleClient::new(config, transport)
            .query(&bssid())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(coordinate.latitude, 48.8584);
        assert_eq!(coordinate.longitude, 2.2945);
    }
}
