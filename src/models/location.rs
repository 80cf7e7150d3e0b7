//! Normalized lookup results shared by every provider client.

use crate::error::{AppError, Result};
use crate::models::Bssid;
use serde::Serialize;
use std::fmt;

/// The geolocation services a BSSID can be resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Apple,
    Google,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Provider::Apple => "apple",
            Provider::Google => "google",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// The outcome of asking one provider about one BSSID.
///
/// Errors are data here: a failed provider still produces a `QueryResult`, so one
/// provider going wrong never hides the other's answer.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub provider: Provider,
    pub bssid: Bssid,
    pub outcome: Result<Coordinate>,
}

impl QueryResult {
    pub fn success(provider: Provider, bssid: Bssid, coordinate: Coordinate) -> Self {
        Self {
            provider,
            bssid,
            outcome: Ok(coordinate),
        }
    }

    pub fn failure(provider: Provider, bssid: Bssid, error: AppError) -> Self {
        Self {
            provider,
            bssid,
            outcome: Err(error),
        }
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.outcome.as_ref().ok().copied()
    }

    pub fn error(&self) -> Option<&AppError> {
        self.outcome.as_ref().err()
    }
}
