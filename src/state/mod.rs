//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: Where the orchestrator is in a run (idle, searching, expanding authors, done)
//! - `RateSignal`: Quota remaining and reset time read from a response
//! - `EndpointClass`: The three independently limited endpoint classes
//! - `ClassState`: Last known quota state for one endpoint class

mod crawl_phase;
mod rate_state;

// Re-export main types
pub use crawl_phase::CrawlPhase;
pub use rate_state::{ClassState, EndpointClass, RateSignal};
