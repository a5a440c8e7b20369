//! Crawler module for the three-stage amplification crawl
//!
//! This module contains the core crawling logic, including:
//! - The authenticated remote client and its response types
//! - Quota-driven rate limiting per endpoint class
//! - The search, follower and follower-post stages
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod scheduler;
pub mod stages;
pub mod types;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, rate_signal, Endpoint, Fetched, RemoteClient};
pub use scheduler::{RateLimiter, LOW_QUOTA_THRESHOLD, RESET_EDGE_WINDOW};
pub use stages::StageOutput;
pub use types::{FollowerPostRecord, FollowerRecord, PostRecord};
