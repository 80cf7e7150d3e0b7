use crate::api::{AppleClient, GoogleClient, LocationProvider, ReqwestTransport};
use crate::config::Config;
use crate::models::{Bssid, QueryResult};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Locate a Wi-Fi access point by its BSSID using Apple and Google
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Access point hardware address, e.g. AA:BB:CC:DD:EE:FF
    pub bssid: String,
}

/// CLI application
pub struct App {
    providers: Vec<Arc<dyn LocationProvider>>,
}

impl App {
    /// Create the application with the Apple and Google clients sharing one HTTP client
    pub fn new(config: &Config) -> crate::error::Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.timeout)?);

        let apple = AppleClient::new(config.apple.clone(), transport.clone());
        let google = GoogleClient::new(config.google.clone(), transport);

        let providers: Vec<Arc<dyn LocationProvider>> = vec![Arc::new(apple), Arc::new(google)];
        Ok(Self::with_providers(providers))
    }

    pub fn with_providers(providers: Vec<Arc<dyn LocationProvider>>) -> Self {
        Self { providers }
    }

    /// Query every provider concurrently and wait for all of them.
    ///
    /// Always yields one result per provider, in completion order.
    pub async fn lookup(&self, bssid: &Bssid) -> Vec<QueryResult> {
        info!(
            "Looking up {} with {} providers",
            bssid,
            self.providers.len()
        );

        let (tx, mut rx) = mpsc::channel(self.providers.len().max(1));
        let mut handles = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let kind = provider.provider();
            let bssid = bssid.clone();
            let tx = tx.clone();

            let handle = tokio::spawn(async move {
                let result = provider.locate(&bssid).await;
                // The receiver is held until every sender is gone.
                let _ = tx.send(result).await;
            });
            handles.push((kind, handle));
        }
        drop(tx);

        let mut results = Vec::with_capacity(self.providers.len());
        while let Some(result) = rx.recv().await {
            results.push(result);
        }

        for (kind, handle) in handles {
            if let Err(e) = handle.await {
                error!("{} task did not complete: {}", kind, e);
                results.push(QueryResult::failure(kind, bssid.clone(), e.into()));
            }
        }

        results
    }
}

/// Render a result as a single uncoloured output line.
pub fn format_result(result: &QueryResult) -> String {
    match &result.outcome {
        Ok(coordinate) => format!(
            "{} result: BSSID={}, Lat={}, Lon={}",
            result.provider, result.bssid, coordinate.latitude, coordinate.longitude
        ),
        Err(e) => format!("{} error: {}", result.provider, e),
    }
}
