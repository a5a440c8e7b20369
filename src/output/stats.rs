//! Run statistics
//!
//! Counters accumulated by the orchestrator over one run and printed when the
//! run finishes.

use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStatistics {
    /// Target URLs in the input list
    pub urls_total: usize,

    /// Target URLs whose search call completed
    pub urls_searched: usize,

    /// Original posts found across all searches
    pub original_posts: usize,

    /// Authors whose followers were fetched
    pub authors_expanded: usize,

    /// Follower records fetched
    pub followers: usize,

    /// Follower post records fetched
    pub follower_posts: usize,

    /// Follower or follower-post lookups skipped after a remote error
    pub items_skipped: usize,

    /// Number of times a stage was suspended by the rate limiter
    pub throttle_stalls: usize,

    /// Total time spent suspended by the rate limiter
    pub stalled_for: Duration,

    /// Wall time of the run
    pub elapsed: Duration,
}

impl CrawlStatistics {
    pub fn new(urls_total: usize) -> Self {
        Self {
            urls_total,
            ..Self::default()
        }
    }

    /// Records one rate limiter suspension
    pub fn record_stall(&mut self, waited: Duration) {
        self.throttle_stalls += 1;
        self.stalled_for += waited;
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Targets:");
    println!(
        "  URLs searched: {} / {}",
        stats.urls_searched, stats.urls_total
    );
    println!("  Original posts: {}", stats.original_posts);
    println!();

    println!("Amplification:");
    println!("  Authors expanded: {}", stats.authors_expanded);
    println!("  Followers fetched: {}", stats.followers);
    println!("  Follower posts fetched: {}", stats.follower_posts);
    if stats.items_skipped > 0 {
        println!("  Items skipped after errors: {}", stats.items_skipped);
    }
    println!();

    println!("Rate Limiting:");
    println!("  Stalls: {}", stats.throttle_stalls);
    println!("  Time stalled: {:.1}s", stats.stalled_for.as_secs_f64());
    println!();

    println!("Elapsed: {:.1}s", stats.elapsed.as_secs_f64());
}
