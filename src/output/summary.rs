//! End-of-run summary

use crate::crawler::CrawlOutcome;
use std::fmt::Write;

/// Outcomes of every subdomain handled in one run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    outcomes: Vec<CrawlOutcome>,

    /// Subdomains skipped because the registry marks them complete
    skipped: Vec<String>,

    /// Subdomains whose crawl stopped on an error, with the error
    failed: Vec<(String, String)>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: CrawlOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn record_skipped(&mut self, subdomain: &str) {
        self.skipped.push(subdomain.to_string());
    }

    /// Records a subdomain whose crawl ended in an error
    pub fn record_failed(&mut self, subdomain: &str, error: impl std::fmt::Display) {
        self.failed.push((subdomain.to_string(), error.to_string()));
    }

    pub fn outcomes(&self) -> &[CrawlOutcome] {
        &self.outcomes
    }

    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn failed(&self) -> &[(String, String)] {
        &self.failed
    }

    /// Documents recorded across all crawled subdomains
    pub fn total_documents(&self) -> usize {
        self.outcomes.iter().map(|o| o.document_count).sum()
    }

    /// Document errors across all crawled subdomains
    pub fn total_errors(&self) -> usize {
        self.outcomes.iter().map(|o| o.error_count).sum()
    }

    /// Returns true if every crawled subdomain finished and none failed
    pub fn all_complete(&self) -> bool {
        self.failed.is_empty() && self.outcomes.iter().all(|o| o.complete)
    }

    /// Renders the summary as a fixed-width table
    pub fn render(&self) -> String {
        let width = self
            .outcomes
            .iter()
            .map(|o| o.subdomain.len())
            .chain(self.skipped.iter().map(|s| s.len()))
            .chain(self.failed.iter().map(|(s, _)| s.len()))
            .chain(std::iter::once("subdomain".len()))
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<width$}  {:>9}  {:>6}  {:>14}  {:>8}  status",
            "subdomain", "documents", "errors", "failed folders", "pending"
        );

        for o in &self.outcomes {
            let status = match &o.bootstrap_error {
                Some(error) => format!("bootstrap failed: {}", error),
                None => o.phase.to_string(),
            };
            let _ = writeln!(
                out,
                "{:<width$}  {:>9}  {:>6}  {:>14}  {:>8}  {}",
                o.subdomain,
                o.document_count,
                o.error_count,
                o.folders_failed,
                o.folders_pending,
                status
            );
        }

        for subdomain in &self.skipped {
            let _ = writeln!(out, "{:<width$}  skipped (complete)", subdomain);
        }

        for (subdomain, error) in &self.failed {
            let _ = writeln!(out, "{:<width$}  failed: {}", subdomain, error);
        }

        let _ = writeln!(
            out,
            "\n{} documents, {} with errors, {} of {} subdomains complete",
            self.total_documents(),
            self.total_errors(),
            self.outcomes.iter().filter(|o| o.complete).count(),
            self.outcomes.len() + self.failed.len()
        );
        out
    }

    /// Prints the summary to stdout
    pub fn print(&self) {
        print!("{}", self.render());
    }
}
