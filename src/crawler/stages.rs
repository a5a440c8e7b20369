//! Crawl stages
//!
//! Each stage makes one remote call, turns the response into records, and
//! appends them to its store:
//! - Search: original posts referencing a target URL, paired with their authors
//! - Followers: the first page of an author's followers
//! - Follower posts: the first page of a follower's recent posts
//!
//! Pagination cursors are never followed. A missing result count on an
//! otherwise successful response means zero results, not an error.

use crate::config::{FollowersConfig, PostsConfig, SearchConfig};
use crate::crawler::fetcher::{Endpoint, RemoteClient};
use crate::crawler::types::{
    FollowerPostRecord, FollowerRecord, PostRecord, SearchResponse, TweetsResponse, UsersResponse,
};
use crate::output::{ResultSink, Store};
use crate::state::RateSignal;
use crate::Result;

/// Records produced by one stage call and the quota signal of that call
#[derive(Debug)]
pub struct StageOutput<T> {
    pub records: Vec<T>,
    pub rate: Option<RateSignal>,
}

/// Number of search results that can be paired positionally
///
/// Bounded by the declared count and by both parallel lists, so unequal
/// lengths never cause a mismatched pairing. Zero when the count is absent.
pub fn usable_count(response: &SearchResponse) -> usize {
    let declared = response.result_count().unwrap_or(0) as usize;
    declared
        .min(response.users().len())
        .min(response.posts().len())
}

/// Selects the original posts whose author matches the user at the same index
///
/// A post is kept only if it references no other post and its `author_id`
/// equals the id of `includes.users[i]` for the same `i`. A match at some
/// other index does not count.
pub fn select_original_posts(response: &SearchResponse) -> Vec<PostRecord> {
    response
        .posts()
        .iter()
        .zip(response.users())
        .take(usable_count(response))
        .filter(|(post, _)| post.is_original())
        .filter(|(post, user)| post.author_id.as_deref() == Some(user.id.as_str()))
        .map(|(post, user)| PostRecord {
            post_id: post.id.clone(),
            author_id: user.id.clone(),
            username: user.username.clone(),
            display_name: user.name.clone().unwrap_or_default(),
            created_at: post.created_at.clone(),
        })
        .collect()
}

/// Followers from a followers response, bounded by the declared count and page size
pub fn collect_followers(response: &UsersResponse, page_size: u32) -> Vec<FollowerRecord> {
    let declared = response.result_count().unwrap_or(0) as usize;
    response
        .users()
        .iter()
        .take(declared.min(page_size as usize))
        .map(|user| FollowerRecord {
            user_id: user.id.clone(),
            username: user.username.clone(),
        })
        .collect()
}

/// Post texts from a user-posts response
///
/// Returns None when the result count is absent, which the remote service
/// does for users with no eligible posts.
pub fn collect_posts(response: &TweetsResponse, page_size: u32) -> Option<Vec<FollowerPostRecord>> {
    let declared = response.result_count()? as usize;
    Some(
        response
            .posts()
            .iter()
            .take(declared.min(page_size as usize))
            .map(|post| FollowerPostRecord {
                text: post.text.clone(),
            })
            .collect(),
    )
}

/// Finds original posts referencing `target_url`
///
/// The batch is appended to the search store under `url_index`, unless no
/// result could be paired at all, in which case nothing is written. A batch
/// whose posts were all filtered out as non-original is still written, as `[]`.
pub async fn search_original_posts<S: ResultSink>(
    client: &RemoteClient,
    sink: &mut S,
    config: &SearchConfig,
    url_index: usize,
    target_url: &str,
) -> Result<StageOutput<PostRecord>> {
    let params = [
        ("query", config.query_for(target_url)),
        ("expansions", "author_id".to_string()),
        ("tweet.fields", config.tweet_fields.clone()),
        ("max_results", config.max_results.to_string()),
    ];

    let fetched = client
        .fetch::<SearchResponse>(&Endpoint::Search, &params)
        .await?;
    let response = fetched.body;

    if response.result_count().is_none() {
        tracing::debug!(url_index, "Search response has no result count, treating as empty");
    }

    let usable = usable_count(&response);
    if usable == 0 {
        return Ok(StageOutput {
            records: Vec::new(),
            rate: fetched.rate,
        });
    }

    let records = select_original_posts(&response);
    sink.append(Store::Search, &url_index.to_string(), &records)?;

    tracing::debug!(
        url_index,
        usable,
        originals = records.len(),
        "Search results filtered"
    );

    Ok(StageOutput {
        records,
        rate: fetched.rate,
    })
}

/// Fetches the first page of followers of `user_id`
///
/// The batch is always appended, even when empty, so "checked, none found"
/// can be told apart from "never checked".
pub async fn followers_of<S: ResultSink>(
    client: &RemoteClient,
    sink: &mut S,
    config: &FollowersConfig,
    user_id: &str,
) -> Result<StageOutput<FollowerRecord>> {
    let params = [
        ("max_results", config.max_results.to_string()),
        ("user.fields", config.user_fields.clone()),
    ];

    let fetched = client
        .fetch::<UsersResponse>(&Endpoint::Followers(user_id.to_string()), &params)
        .await?;

    let records = collect_followers(&fetched.body, config.max_results);
    if let Some(cursor) = fetched.body.next_token() {
        tracing::debug!(
            user_id,
            next_token = cursor,
            "More followers available, keeping first page"
        );
    }
    sink.append(Store::Followers, user_id, &records)?;

    tracing::debug!(user_id, followers = records.len(), "Followers fetched");

    Ok(StageOutput {
        records,
        rate: fetched.rate,
    })
}

/// Fetches the first page of recent posts of `user_id`
///
/// Nothing is written when the response carries no result count.
pub async fn recent_posts_of<S: ResultSink>(
    client: &RemoteClient,
    sink: &mut S,
    config: &PostsConfig,
    user_id: &str,
) -> Result<StageOutput<FollowerPostRecord>> {
    let params = [
        ("max_results", config.max_results.to_string()),
        ("tweet.fields", config.tweet_fields.clone()),
    ];

    let fetched = client
        .fetch::<TweetsResponse>(&Endpoint::Posts(user_id.to_string()), &params)
        .await?;

    if let Some(cursor) = fetched.body.next_token() {
        tracing::debug!(
            user_id,
            next_token = cursor,
            "More posts available, keeping first page"
        );
    }

    let records = match collect_posts(&fetched.body, config.max_results) {
        Some(records) => {
            sink.append(Store::FollowerPosts, user_id, &records)?;
            records
        }
        None => {
            tracing::debug!(user_id, "Posts response has no result count, treating as empty");
            Vec::new()
        }
    };

    tracing::debug!(user_id, posts = records.len(), "Follower posts fetched");

    Ok(StageOutput {
        records,
        rate: fetched.rate,
    })
}
