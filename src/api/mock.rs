//! A scripted in-memory transport for exercising provider clients without a network.
//!
//! Each `FakeTransport` answers every request with the same canned response (or
//! error), optionally after a delay, and records what it was sent so tests can
//! assert on call counts and payloads.

use crate::api::{HttpResponse, HttpTransport};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A request as seen by the fake.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub content_type: String,
    pub body: Bytes,
}

pub struct FakeTransport {
    reply: Result<HttpResponse>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeTransport {
    pub fn responding(status: u16, body: impl Into<Bytes>) -> Self {
        Self::with_reply(Ok(HttpResponse {
            status,
            body: body.into(),
        }))
    }

    pub fn failing(error: AppError) -> Self {
        Self::with_reply(Err(error))
    }

    fn with_reply(reply: Result<HttpResponse>) -> Self {
        Self {
            reply,
            delay: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Holds every reply back by `delay`.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn post(&self, url: &str, content_type: &str, body: Bytes) -> Result<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            content_type: content_type.to_string(),
            body,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone()
    }
}
