//! The HTTP seam between provider clients and the network.
//!
//! Provider clients only ever issue a single POST, so the trait is exactly that.
//! Production code uses [`ReqwestTransport`]; tests substitute fakes.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a single POST and hands back the raw reply.
///
/// Implementations must be shareable across tasks, since one transport serves
/// every provider client.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends `body` to `url` and returns whatever the server answered with.
    ///
    /// Non-success status codes are not errors at this layer; only failures to
    /// complete the exchange are.
    async fn post(&self, url: &str, content_type: &str, body: Bytes) -> Result<HttpResponse>;
}

/// An asynchronous transport backed by a shared `reqwest::Client`.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport whose requests each give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(&self, url: &str, content_type: &str, body: Bytes) -> Result<HttpResponse> {
        debug!("POST {} ({} bytes, {})", url, body.len(), content_type);

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!("Request to {} failed: {}", url, e);
                AppError::from(e)
            })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            error!("Failed to read response body from {}: {}", url, e);
            AppError::from(e)
        })?;

        debug!("Received HTTP {} with {} bytes", status, body.len());
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn posts_body_with_content_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/clls/wloc")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::Exact("payload".to_string()))
            .with_status(200)
            .with_body([0u8, 1, 2, 3])
            .create_async()
            .await;

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let response = transport
            .post(
                &format!("{}/clls/wloc", server.url()),
                "application/x-www-form-urlencoded",
                Bytes::from_static(b"payload"),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(response.is_success());
        assert_eq!(response.body.as_ref(), &[0u8, 1, 2, 3]);
    }

    #[tokio::test]
    async fn error_statuses_are_returned_not_raised() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/geolocate")
            .with_status(400)
            .with_body(r#"{"error":{"message":"keyInvalid"}}"#)
            .create_async()
            .await;

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let response = transport
            .post(
                &format!("{}/geolocate", server.url()),
                "application/json",
                Bytes::from_static(b"{}"),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 400);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn connection_failure_is_a_transport_error() {
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        // Port 9 (discard) on loopback is not expected to be listening.
        let err = transport
            .post("http://127.0.0.1:9/", "application/json", Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
    }
}
