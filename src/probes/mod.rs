//! URL probes -- perform a request, time it, and classify the outcome.

pub mod http;
#[cfg(test)]
pub mod mock;

pub use self::http::HttpProbe;

use std::time::Duration;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Outcome class of a single probe attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeStatus {
    Success,
    Failure,
}

impl std::fmt::Display for ScrapeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScrapeStatus::Success => write!(f, "success"),
            ScrapeStatus::Failure => write!(f, "failure"),
        }
    }
}

/// Result of one validation or benchmark attempt against a URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeResult {
    pub url: String,
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
    pub status: ScrapeStatus,
}

impl ScrapeResult {
    pub fn success(url: impl Into<String>, duration: Duration) -> Self {
        Self {
            url: url.into(),
            duration,
            status: ScrapeStatus::Success,
        }
    }

    pub fn failure(url: impl Into<String>, duration: Duration) -> Self {
        Self {
            url: url.into(),
            duration,
            status: ScrapeStatus::Failure,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ScrapeStatus::Success
    }
}

/// Durations are reported human-readable, e.g. `"12.5ms"`.
fn serialize_duration<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&format_args!("{:?}", duration))
}

/// Why a probe attempt failed.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to create request: {0}")]
    RequestConstruction(reqwest::Error),

    #[error("failed to perform request: {0}")]
    Transport(reqwest::Error),

    #[error("unexpected HTTP response status: {0}")]
    UnexpectedStatus(reqwest::StatusCode),
}

/// A failed attempt: the failure-classified result plus its cause.
#[derive(Debug, Error)]
#[error("failed to scrape {}", .result.url)]
pub struct ProbeFailure {
    pub result: ScrapeResult,
    #[source]
    pub cause: ProbeError,
}

/// Contract between the ingestion pipeline and whatever performs the fetch.
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    /// Fetch `url` once, timing the attempt.
    async fn run(&self, url: &str) -> Result<ScrapeResult, ProbeFailure>;
}
