//! Reddit API client (app-only OAuth).
//!
//! Authenticates with the `client_credentials` grant and reads listings
//! from `oauth.reddit.com`. The bearer token is cached until shortly before
//! it expires.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::RedditConfig;
use crate::models::{Comment, CommentRecord, PostRecord};
use crate::source::{ForumArchive, ForumSource};
use crate::SubpulseError;

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";

/// Refresh the token this long before Reddit says it expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

pub const CLIENT_ID_ENV: &str = "SUBPULSE_REDDIT_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "SUBPULSE_REDDIT_CLIENT_SECRET";

/// App-only API credentials.
#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl RedditCredentials {
    pub fn from_env() -> Result<Self, SubpulseError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, SubpulseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key).filter(|v| !v.trim().is_empty()).ok_or_else(|| {
                SubpulseError::Config(format!(
                    "{} is not set. Create a Reddit \"script\" app and export {} and {}",
                    key, CLIENT_ID_ENV, CLIENT_SECRET_ENV
                ))
            })
        };
        Ok(Self {
            client_id: get(CLIENT_ID_ENV)?,
            client_secret: get(CLIENT_SECRET_ENV)?,
        })
    }
}

struct AccessToken {
    value: String,
    refresh_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

// Listing wire types. Only the fields we read are declared.

#[derive(Debug, Deserialize)]
struct Listing<T> {
    data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
struct ListingData<T> {
    children: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct PostThing {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    id: String,
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    subreddit: String,
    #[serde(default)]
    link_flair_text: Option<String>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    downs: i64,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    total_awards_received: i64,
    #[serde(default)]
    num_comments: i64,
    #[serde(default)]
    url: Option<String>,
}

/// A node of a comment tree: `t1` comments, `more` stubs, anything else.
#[derive(Debug, Deserialize)]
struct CommentThing {
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct CommentData {
    id: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    created_utc: f64,
    /// Either an empty string or a nested listing
    #[serde(default)]
    replies: serde_json::Value,
}

pub struct RedditClient {
    http: Client,
    credentials: RedditCredentials,
    token: RwLock<Option<AccessToken>>,
    hot_posts: usize,
    comments_per_post: usize,
}

impl RedditClient {
    pub fn new(credentials: RedditCredentials, config: &RedditConfig) -> Result<Self, SubpulseError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SubpulseError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            credentials,
            token: RwLock::new(None),
            hot_posts: config.hot_posts,
            comments_per_post: config.comments_per_post,
        })
    }

    /// Current bearer token, fetching a new one when missing or near expiry.
    async fn bearer(&self, community: &str) -> Result<String, SubpulseError> {
        {
            let guard = self.token.read().await;
            if let Some(token) = guard.as_ref() {
                if Instant::now() < token.refresh_at {
                    return Ok(token.value.clone());
                }
            }
        }

        let mut guard = self.token.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(token) = guard.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        debug!("Requesting Reddit access token");
        let response = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| SubpulseError::upstream(community, e))?;

        if !response.status().is_success() {
            return Err(SubpulseError::upstream(
                community,
                format!("token request failed: HTTP {}", response.status()),
            ));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SubpulseError::upstream(community, format!("token response: {}", e)))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        let value = token.access_token;
        *guard = Some(AccessToken {
            value: value.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(value)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        community: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SubpulseError> {
        let token = self.bearer(community).await?;
        let url = format!("{}{}", API_BASE, path);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .query(&[("raw_json", "1")])
            .send()
            .await
            .map_err(|e| SubpulseError::upstream(community, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubpulseError::upstream(community, describe_status(status)));
        }

        response
            .json()
            .await
            .map_err(|e| SubpulseError::upstream(community, format!("unexpected response: {}", e)))
    }

    async fn listing(
        &self,
        community: &str,
        sort: &str,
        limit: usize,
    ) -> Result<Vec<PostData>, SubpulseError> {
        let listing: Listing<PostThing> = self
            .get_json(
                community,
                &format!("/r/{}/{}", community, sort),
                &[("limit", limit.to_string())],
            )
            .await?;
        Ok(listing
            .data
            .children
            .into_iter()
            .map(|c| c.data)
            .take(limit)
            .collect())
    }

    async fn comment_tree(
        &self,
        community: &str,
        post_id: &str,
        scope: TreeScope,
    ) -> Result<Vec<CommentThing>, SubpulseError> {
        // Response is [post listing, comment listing]
        let (_, comments): (serde_json::Value, Listing<CommentThing>) = self
            .get_json(
                community,
                &format!("/r/{}/comments/{}", community, post_id),
                &comment_tree_query(scope),
            )
            .await?;
        Ok(comments.data.children)
    }
}

/// How much of a comment tree to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TreeScope {
    /// Top-level comments only.
    TopLevel,
    /// Whatever nesting Reddit returns by default.
    Full,
}

/// Query for the comments endpoint. No `limit` is sent because Reddit
/// counts nested replies against it; callers truncate after parsing.
fn comment_tree_query(scope: TreeScope) -> Vec<(&'static str, String)> {
    match scope {
        TreeScope::TopLevel => vec![("depth", "1".to_string())],
        TreeScope::Full => vec![],
    }
}

fn describe_status(status: StatusCode) -> String {
    match status {
        StatusCode::FORBIDDEN => "HTTP 403: subreddit is private or quarantined".to_string(),
        StatusCode::NOT_FOUND => "HTTP 404: subreddit is banned or does not exist".to_string(),
        StatusCode::TOO_MANY_REQUESTS => "HTTP 429: rate limited".to_string(),
        other => format!("HTTP {}", other),
    }
}

fn timestamp(created_utc: f64) -> DateTime<Utc> {
    Utc.timestamp_opt(created_utc as i64, 0)
        .single()
        .unwrap_or_default()
}

impl PostData {
    fn into_record(self) -> PostRecord {
        let media_type = self
            .url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| "text".to_string());
        PostRecord {
            post_id: self.id,
            title: self.title,
            body: self.selftext,
            subreddit: self.subreddit,
            flair: self.link_flair_text,
            upvotes: self.score,
            downvotes: self.downs,
            total_score: self.score,
            timestamp: timestamp(self.created_utc),
            awards: self.total_awards_received,
            num_comments: self.num_comments,
            media_type,
        }
    }
}

/// Parse a `t1` node; `more` stubs and unknown kinds yield `None`.
fn parse_comment(thing: &CommentThing) -> Option<CommentData> {
    if thing.kind != "t1" {
        return None;
    }
    serde_json::from_value(thing.data.clone()).ok()
}

/// Top-level comments with a body, in listing order.
fn top_level_comments(things: &[CommentThing], limit: usize) -> Vec<CommentData> {
    things
        .iter()
        .filter_map(parse_comment)
        .filter(|c| c.body.is_some())
        .take(limit)
        .collect()
}

/// Flatten a comment tree breadth-first, skipping `more` stubs.
fn flatten_comments(things: Vec<CommentThing>, limit: usize) -> Vec<CommentData> {
    let mut queue: VecDeque<CommentThing> = things.into();
    let mut out = Vec::new();
    while let Some(thing) = queue.pop_front() {
        if out.len() >= limit {
            break;
        }
        let Some(mut comment) = parse_comment(&thing) else {
            continue;
        };
        let replies = std::mem::take(&mut comment.replies);
        if let Ok(listing) = serde_json::from_value::<Listing<CommentThing>>(replies) {
            queue.extend(listing.data.children);
        }
        out.push(comment);
    }
    out
}

#[async_trait]
impl ForumSource for RedditClient {
    async fn fetch(&self, community: &str) -> Result<Vec<Comment>, SubpulseError> {
        let posts = self.listing(community, "hot", self.hot_posts).await?;
        info!("Fetched {} hot posts from r/{}", posts.len(), community);

        // Fetched concurrently, results stay in listing order
        let trees = futures::future::try_join_all(
            posts
                .iter()
                .map(|post| self.comment_tree(community, &post.id, TreeScope::TopLevel)),
        )
        .await?;

        let mut comments = Vec::new();
        for (post, tree) in posts.iter().zip(trees) {
            comments.extend(
                top_level_comments(&tree, self.comments_per_post)
                    .into_iter()
                    .filter_map(|c| c.body)
                    .map(|body| Comment::new(post.title.clone(), body)),
            );
        }
        debug!("Collected {} comments from r/{}", comments.len(), community);
        Ok(comments)
    }
}

#[async_trait]
impl ForumArchive for RedditClient {
    async fn list_new_posts(
        &self,
        community: &str,
        limit: usize,
    ) -> Result<Vec<PostRecord>, SubpulseError> {
        let posts = self.listing(community, "new", limit).await?;
        Ok(posts.into_iter().map(PostData::into_record).collect())
    }

    async fn list_comments(
        &self,
        post: &PostRecord,
        limit: usize,
    ) -> Result<Vec<CommentRecord>, SubpulseError> {
        let community = post.subreddit.to_lowercase();
        let tree = self
            .comment_tree(&community, &post.post_id, TreeScope::Full)
            .await?;
        Ok(flatten_comments(tree, limit)
            .into_iter()
            .map(|c| CommentRecord {
                post_id: post.post_id.clone(),
                comment_id: c.id,
                author: c.author.unwrap_or_else(|| "deleted".to_string()),
                body: c.body.unwrap_or_default(),
                upvotes: c.score,
                timestamp: timestamp(c.created_utc),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_comment_tree_query_never_limits_nested_replies() {
        assert_eq!(
            comment_tree_query(TreeScope::TopLevel),
            vec![("depth", "1".to_string())]
        );
        assert!(comment_tree_query(TreeScope::Full).is_empty());
        for scope in [TreeScope::TopLevel, TreeScope::Full] {
            assert!(comment_tree_query(scope).iter().all(|(k, _)| *k != "limit"));
        }
    }

    #[test]
    fn test_deep_first_thread_does_not_crowd_out_top_level() {
        let replies: Vec<serde_json::Value> = (0..39)
            .map(|i| comment(&format!("r{}", i), "nested", json!("")))
            .collect();
        let mut top = vec![comment("t0", "first", listing(replies))];
        top.extend((1..45).map(|i| comment(&format!("t{}", i), "top", json!(""))));
        let thread = things(listing(top));

        let kept = top_level_comments(&thread, 40);
        assert_eq!(kept.len(), 40);
        assert_eq!(kept[39].id, "t39");

        let flat = flatten_comments(thread, 10);
        let ids: Vec<&str> = flat.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["t0", "t1", "t2", "t3", "t4", "t5", "t6", "t7", "t8", "t9"]);
    }

    fn comment(id: &str, body: &str, replies: serde_json::Value) -> serde_json::Value {
        json!({
            "kind": "t1",
            "data": {
                "id": id,
                "author": "someone",
                "body": body,
                "score": 3,
                "created_utc": 1700000000.0,
                "replies": replies
            }
        })
    }

    fn listing(children: Vec<serde_json::Value>) -> serde_json::Value {
        json!({ "kind": "Listing", "data": { "children": children } })
    }

    fn things(value: serde_json::Value) -> Vec<CommentThing> {
        serde_json::from_value::<Listing<CommentThing>>(value)
            .unwrap()
            .data
            .children
    }

    fn tree() -> Vec<CommentThing> {
        things(listing(vec![
            comment(
                "a",
                "first",
                listing(vec![
                    comment("a1", "reply to first", json!("")),
                    json!({ "kind": "more", "data": { "count": 4, "children": ["x", "y"] } }),
                ]),
            ),
            comment("b", "second", json!("")),
            json!({ "kind": "more", "data": { "count": 12 } }),
        ]))
    }

    #[test]
    fn test_top_level_comments_skip_more_stubs() {
        let comments = top_level_comments(&tree(), 40);
        let ids: Vec<&str> = comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_top_level_comments_respect_limit() {
        assert_eq!(top_level_comments(&tree(), 1).len(), 1);
    }

    #[test]
    fn test_flatten_is_breadth_first() {
        let comments = flatten_comments(tree(), 10);
        let ids: Vec<&str> = comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "a1"]);
    }

    #[test]
    fn test_flatten_limit() {
        let comments = flatten_comments(tree(), 2);
        assert_eq!(comments.len(), 2);
    }

    #[test]
    fn test_deleted_author_parses_as_none() {
        let thing = things(listing(vec![json!({
            "kind": "t1",
            "data": { "id": "z", "author": null, "body": "[deleted]", "replies": "" }
        })]));
        let parsed = parse_comment(&thing[0]).unwrap();
        assert_eq!(parsed.author, None);
    }

    #[test]
    fn test_post_record_mapping() {
        let post: Listing<PostThing> = serde_json::from_value(listing(vec![json!({
            "kind": "t3",
            "data": {
                "id": "abc123",
                "title": "Bread on a birch",
                "selftext": "",
                "subreddit": "BreadStapledToTrees",
                "link_flair_text": null,
                "score": 42,
                "downs": 0,
                "created_utc": 1700000000.0,
                "total_awards_received": 1,
                "num_comments": 7,
                "url": "https://i.redd.it/bread.jpg"
            }
        })]))
        .unwrap();
        let record = post.data.children.into_iter().next().unwrap().data.into_record();
        assert_eq!(record.post_id, "abc123");
        assert_eq!(record.total_score, 42);
        assert_eq!(record.media_type, "https://i.redd.it/bread.jpg");
        assert_eq!(record.timestamp.timestamp(), 1_700_000_000);
        assert_eq!(record.flair, None);
    }

    #[test]
    fn test_self_post_without_url_is_text() {
        let data: PostData = serde_json::from_value(json!({
            "id": "p", "title": "t", "url": ""
        }))
        .unwrap();
        assert_eq!(data.into_record().media_type, "text");
    }

    #[test]
    fn test_credentials_from_lookup() {
        let creds = RedditCredentials::from_lookup(|key| match key {
            CLIENT_ID_ENV => Some("id".to_string()),
            CLIENT_SECRET_ENV => Some("secret".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(creds.client_id, "id");
        assert!(!format!("{:?}", creds).contains("\"secret\""));
    }

    #[test]
    fn test_missing_credentials_is_config_error() {
        let err = RedditCredentials::from_lookup(|key| {
            (key == CLIENT_ID_ENV).then(|| "id".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, SubpulseError::Config(ref m) if m.contains(CLIENT_SECRET_ENV)));
    }

    #[test]
    fn test_describe_status() {
        assert!(describe_status(StatusCode::FORBIDDEN).contains("private"));
        assert_eq!(describe_status(StatusCode::BAD_GATEWAY), "HTTP 502 Bad Gateway");
    }
}
