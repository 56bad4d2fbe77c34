//! Benchmark refresh summary and its log formatting.

use serde::Serialize;

use crate::probes::ScrapeResult;

/// Aggregate of one refresh cycle, folded in result arrival order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScrapeSummary {
    #[serde(rename = "scrape_durations")]
    pub results: Vec<ScrapeResult>,
    pub success_count: usize,
    pub failure_count: usize,
}

impl ScrapeSummary {
    pub fn push(&mut self, result: ScrapeResult) {
        if result.is_success() {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Format a summary as a single human-readable line.
pub fn format_summary(summary: &ScrapeSummary) -> String {
    let mut line = format!(
        "{} URL{} benchmarked: {} succeeded, {} failed",
        summary.len(),
        if summary.len() == 1 { "" } else { "s" },
        summary.success_count,
        summary.failure_count,
    );

    for result in &summary.results {
        line.push_str(&format!(
            "; {} {:?} ({})",
            result.url, result.duration, result.status
        ));
    }

    line
}

/// Render a summary as one-line JSON, per-URL records included, for
/// structured log output.
pub fn summary_json(summary: &ScrapeSummary) -> String {
    serde_json::to_string(summary)
        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
}
