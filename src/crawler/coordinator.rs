//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that sequences the three stages:
//! - Pacing each target URL with a fixed floor delay
//! - Searching for original posts referencing the URL
//! - Expanding every author into followers, and every follower into posts
//! - Throttling each endpoint class on its previous quota signal
//! - Applying the failure policy for per-item remote errors

use crate::config::Config;
use crate::crawler::fetcher::RemoteClient;
use crate::crawler::scheduler::RateLimiter;
use crate::crawler::stages;
use crate::crawler::types::{FollowerRecord, PostRecord};
use crate::output::{CrawlStatistics, JsonLinesSink, ResultSink};
use crate::state::{CrawlPhase, EndpointClass, RateSignal};
use crate::{CrawlError, Result};
use std::time::{Duration, Instant};

/// Main crawler coordinator structure
///
/// Runs everything on the calling task, one remote call at a time, so the
/// per-class quota bookkeeping in the limiter needs no locking.
pub struct Coordinator<S: ResultSink = JsonLinesSink> {
    config: Config,
    client: RemoteClient,
    sink: S,
    limiter: RateLimiter,
    phase: CrawlPhase,
    stats: CrawlStatistics,
}

impl Coordinator<JsonLinesSink> {
    /// Creates a coordinator writing JSON-lines files under the configured output directory
    ///
    /// # Arguments
    ///
    /// * `config` - The crawl configuration
    /// * `bearer_token` - Token for the remote service
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CrawlError)` - Failed to build the HTTP client
    pub fn new(config: Config, bearer_token: &str) -> Result<Self> {
        let client = RemoteClient::new(&config.api, bearer_token)?;
        let sink = JsonLinesSink::new(&config.output.directory);
        Ok(Self::with_sink(config, client, sink))
    }
}

impl<S: ResultSink> Coordinator<S> {
    /// Creates a coordinator writing through an arbitrary sink
    pub fn with_sink(config: Config, client: RemoteClient, sink: S) -> Self {
        Self {
            config,
            client,
            sink,
            limiter: RateLimiter::new(),
            phase: CrawlPhase::Idle,
            stats: CrawlStatistics::default(),
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Runs the crawl over `targets` in order
    ///
    /// A coordinator runs once; calling this again after completion fails
    /// with an invalid transition.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStatistics)` - Every URL was processed
    /// * `Err(CrawlError)` - A fatal error halted the run; files written so
    ///   far are kept
    pub async fn run(&mut self, targets: &[String]) -> Result<CrawlStatistics> {
        let started = Instant::now();
        self.stats = CrawlStatistics::new(targets.len());

        tracing::info!("Starting crawl of {} urls", targets.len());

        for (url_index, url) in targets.iter().enumerate() {
            self.process_url(url_index, url).await?;
        }

        self.transition(CrawlPhase::Done)?;
        self.stats.elapsed = started.elapsed();

        tracing::info!(
            "Crawl completed: {} urls, {} original posts, {} followers, {} follower posts in {:?}",
            self.stats.urls_searched,
            self.stats.original_posts,
            self.stats.followers,
            self.stats.follower_posts,
            self.stats.elapsed
        );

        Ok(self.stats.clone())
    }

    /// Processes a single target URL
    ///
    /// This method:
    /// 1. Waits the pacing delay
    /// 2. Searches for original posts
    /// 3. Throttles on the previous search signal
    /// 4. Expands every author found
    async fn process_url(&mut self, url_index: usize, url: &str) -> Result<()> {
        self.transition(CrawlPhase::Searching { url_index })?;

        let pacing = self.config.crawler.pacing_delay();
        if pacing > Duration::ZERO {
            tokio::time::sleep(pacing).await;
        }

        let found = stages::search_original_posts(
            &self.client,
            &mut self.sink,
            &self.config.search,
            url_index,
            url,
        )
        .await?;

        self.stats.urls_searched += 1;
        self.stats.original_posts += found.records.len();
        tracing::info!("{} original posts: {}", url, found.records.len());

        self.throttle(EndpointClass::Search, found.rate).await;

        self.transition(CrawlPhase::ExpandingAuthors { url_index })?;
        for post in &found.records {
            self.expand_author(post).await?;
        }

        Ok(())
    }

    /// Fetches an author's followers, then each follower's recent posts
    async fn expand_author(&mut self, post: &PostRecord) -> Result<()> {
        let followers = match stages::followers_of(
            &self.client,
            &mut self.sink,
            &self.config.followers,
            &post.author_id,
        )
        .await
        {
            Ok(output) => output,
            Err(e) => return self.skip_or_fail(e, "followers", &post.author_id),
        };

        self.stats.authors_expanded += 1;
        self.stats.followers += followers.records.len();
        tracing::info!(
            "{} (@{}) followers: {}",
            post.author_id,
            post.username,
            followers.records.len()
        );

        self.throttle(EndpointClass::Followers, followers.rate).await;

        for follower in &followers.records {
            self.expand_follower(follower).await?;
        }

        Ok(())
    }

    /// Fetches one follower's recent posts
    async fn expand_follower(&mut self, follower: &FollowerRecord) -> Result<()> {
        let posts = match stages::recent_posts_of(
            &self.client,
            &mut self.sink,
            &self.config.posts,
            &follower.user_id,
        )
        .await
        {
            Ok(output) => output,
            Err(e) => return self.skip_or_fail(e, "posts", &follower.user_id),
        };

        self.stats.follower_posts += posts.records.len();
        tracing::debug!(
            "{} (@{}) recent posts: {}",
            follower.user_id,
            follower.username,
            posts.records.len()
        );

        self.throttle(EndpointClass::Posts, posts.rate).await;

        Ok(())
    }

    /// Records the latest signal for `class` and throttles on the previous one
    async fn throttle(&mut self, class: EndpointClass, rate: Option<RateSignal>) {
        if let Some(waited) = self.limiter.advance(class, rate).await {
            self.stats.record_stall(waited);
        }
    }

    /// Applies the failure policy to a per-item error
    ///
    /// Remote failures are skipped only when `skip-failed-items` is set;
    /// everything else halts the run.
    fn skip_or_fail(&mut self, error: CrawlError, stage: &str, user_id: &str) -> Result<()> {
        if self.config.crawler.skip_failed_items && error.is_remote_failure() {
            tracing::warn!(stage, user_id, "Skipping after remote error: {}", error);
            self.stats.items_skipped += 1;
            return Ok(());
        }
        Err(error)
    }

    /// Moves to `next`, rejecting transitions the run order does not allow
    fn transition(&mut self, next: CrawlPhase) -> Result<()> {
        if !self.phase.can_transition_to(&next) {
            return Err(CrawlError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::trace!("Phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }
}

/// Runs the main crawl operation
///
/// # Arguments
///
/// * `config` - The crawl configuration
/// * `bearer_token` - Token for the remote service
/// * `targets` - De-duplicated target URLs
///
/// # Example
///
/// ```no_run
/// use spread_mapper::config::Config;
/// use spread_mapper::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let targets = vec!["example.com/story".to_string()];
/// let stats = run_crawl(Config::default(), "token", &targets).await?;
/// println!("{} original posts", stats.original_posts);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    bearer_token: &str,
    targets: &[String],
) -> Result<CrawlStatistics> {
    let mut coordinator = Coordinator::new(config, bearer_token)?;
    coordinator.run(targets).await
}
