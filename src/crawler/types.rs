//! Remote response shapes and the records the stages emit
//!
//! Only the fields the crawl reads are modelled. Everything is optional on the
//! wire because the remote service omits empty members instead of sending
//! empty arrays or zero counts.

use serde::{Deserialize, Serialize};

/// Response metadata shared by every endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    /// Number of results in `data`; omitted when there are none
    #[serde(default)]
    pub result_count: Option<u64>,

    /// Cursor for the next page; never followed, only logged
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Includes {
    #[serde(default)]
    pub users: Option<Vec<User>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferencedTweet {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tweet {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Present on replies, retweets and quotes
    #[serde(default)]
    pub referenced_tweets: Option<Vec<ReferencedTweet>>,
}

impl Tweet {
    /// True if the post does not reference another post
    pub fn is_original(&self) -> bool {
        self.referenced_tweets.is_none()
    }
}

/// Body of the recent-search endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Option<Vec<Tweet>>,
    #[serde(default)]
    pub includes: Option<Includes>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

impl SearchResponse {
    pub fn result_count(&self) -> Option<u64> {
        self.meta.as_ref().and_then(|m| m.result_count)
    }

    pub fn posts(&self) -> &[Tweet] {
        self.data.as_deref().unwrap_or_default()
    }

    pub fn users(&self) -> &[User] {
        self.includes
            .as_ref()
            .and_then(|i| i.users.as_deref())
            .unwrap_or_default()
    }
}

/// Body of the followers endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub data: Option<Vec<User>>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

impl UsersResponse {
    pub fn result_count(&self) -> Option<u64> {
        self.meta.as_ref().and_then(|m| m.result_count)
    }

    /// Cursor of the page after this one, if the result was cut off
    pub fn next_token(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| m.next_token.as_deref())
    }

    pub fn users(&self) -> &[User] {
        self.data.as_deref().unwrap_or_default()
    }
}

/// Body of the user-posts endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TweetsResponse {
    #[serde(default)]
    pub data: Option<Vec<Tweet>>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

impl TweetsResponse {
    pub fn result_count(&self) -> Option<u64> {
        self.meta.as_ref().and_then(|m| m.result_count)
    }

    /// Cursor of the page after this one, if the result was cut off
    pub fn next_token(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| m.next_token.as_deref())
    }

    pub fn posts(&self) -> &[Tweet] {
        self.data.as_deref().unwrap_or_default()
    }
}

/// An original post referencing a target URL, paired with its author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub post_id: String,
    pub author_id: String,
    pub username: String,
    pub display_name: String,
    pub created_at: Option<String>,
}

/// One follower of an author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowerRecord {
    pub user_id: String,
    pub username: String,
}

/// One recent post of a follower
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowerPostRecord {
    pub text: String,
}
