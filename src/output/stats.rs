//! Statistics over the subdomain registry
//!
//! This module provides the `--stats` view of what earlier runs recorded.

use crate::storage::Registry;

/// Registry statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStatistics {
    /// Subdomains with a registry entry
    pub subdomains: usize,

    /// Subdomains whose crawl finished
    pub complete: usize,

    /// Documents recorded across all subdomains
    pub documents: usize,
}

impl RegistryStatistics {
    /// Computes statistics from a registry
    pub fn from_registry(registry: &Registry) -> Self {
        Self {
            subdomains: registry.len(),
            complete: registry.values().filter(|e| e.complete).count(),
            documents: registry.values().map(|e| e.document_count).sum(),
        }
    }
}

/// Prints the registry to stdout in a formatted manner
///
/// # Arguments
///
/// * `registry` - The registry to display
pub fn print_statistics(registry: &Registry) {
    let stats = RegistryStatistics::from_registry(registry);

    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Subdomains crawled: {}", stats.subdomains);
    println!("  Complete: {}", stats.complete);
    println!("  Documents recorded: {}", stats.documents);
    println!();

    if registry.is_empty() {
        println!("No subdomains crawled yet");
        return;
    }

    println!("Subdomains:");
    for (subdomain, entry) in registry {
        println!(
            "  {}: {} documents{}",
            subdomain,
            entry.document_count,
            if entry.complete { "" } else { " (incomplete)" }
        );
    }
}
