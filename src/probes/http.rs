use super::{Probe, ProbeError, ProbeFailure, ScrapeResult};
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};

/// HTTP probe: GET the URL, drain the body, expect `200 OK`.
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    /// Build a probe whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("urlscraper/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Probe for HttpProbe {
    async fn run(&self, url: &str) -> Result<ScrapeResult, ProbeFailure> {
        let failed = |duration: Duration, cause: ProbeError| ProbeFailure {
            result: ScrapeResult::failure(url, duration),
            cause,
        };

        let request = self
            .client
            .get(url)
            .build()
            .map_err(|e| failed(Duration::ZERO, ProbeError::RequestConstruction(e)))?;

        let start = Instant::now();
        let mut response = match self.client.execute(request).await {
            Ok(resp) => resp,
            Err(e) => return Err(failed(start.elapsed(), ProbeError::Transport(e))),
        };

        // The body must arrive in full, and the drain counts towards the
        // measured duration.
        loop {
            match response.chunk().await {
                Ok(Some(_)) => continue,
                Ok(None) => break,
                Err(e) => return Err(failed(start.elapsed(), ProbeError::Transport(e))),
            }
        }
        let duration = start.elapsed();

        let status = response.status();
        if status != StatusCode::OK {
            return Err(failed(duration, ProbeError::UnexpectedStatus(status)));
        }

        Ok(ScrapeResult::success(url, duration))
    }
}
