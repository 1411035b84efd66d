//! Upstream API seam (`RedditApi`) and its blocking HTTP implementation.

use crate::config::{CommentSort, Credentials, ListingSort};
use crate::reddit_types::{CommentThing, CommentsResponse, Identity, LinkData, Listing, Thing, TokenResponse};
use anyhow::{anyhow, bail, Context, Result};
use parking_lot::Mutex;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};

/// One listing page request.
#[derive(Clone, Debug)]
pub struct ListingRequest {
    pub subreddit: String,
    pub sort: ListingSort,
    pub after: Option<String>,
    pub limit: usize,
}

/// Everything the pipeline needs from upstream. Errors are not retried here.
pub trait RedditApi {
    /// Identity round trip. `Ok(None)` means the server answered but named nobody.
    fn me(&self) -> Result<Option<String>>;

    /// One page of posts, in listing order.
    fn listing(&self, req: &ListingRequest) -> Result<Vec<LinkData>>;

    /// Top-level comment nodes of a post in `sort` order, without expanding "more" stubs.
    fn comments(&self, post_id: &str, sort: CommentSort, limit: usize) -> Result<Vec<CommentThing>>;
}

impl<T: RedditApi + ?Sized> RedditApi for &T {
    fn me(&self) -> Result<Option<String>> { (**self).me() }
    fn listing(&self, req: &ListingRequest) -> Result<Vec<LinkData>> { (**self).listing(req) }
    fn comments(&self, post_id: &str, sort: CommentSort, limit: usize) -> Result<Vec<CommentThing>> {
        (**self).comments(post_id, sort, limit)
    }
}

struct Token {
    value: String,
    expires_at: Instant,
}

/// Password-grant OAuth client for a "script" app.
pub struct HttpApi {
    http: Client,
    creds: Credentials,
    auth_base: String,
    api_base: String,
    token: Mutex<Option<Token>>,
}

impl HttpApi {
    pub const AUTH_BASE_URL: &'static str = "https://www.reddit.com";
    pub const API_BASE_URL: &'static str = "https://oauth.reddit.com";

    pub fn new(creds: Credentials) -> Result<Self> {
        let ua = if creds.user_agent.trim().is_empty() {
            concat!("rscrape/", env!("CARGO_PKG_VERSION")).to_string()
        } else {
            creds.user_agent.clone()
        };
        let http = Client::builder()
            .user_agent(ua)
            .timeout(Duration::from_secs(60))
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            creds,
            auth_base: Self::AUTH_BASE_URL.to_string(),
            api_base: Self::API_BASE_URL.to_string(),
            token: Mutex::new(None),
        })
    }

    /// Point the client at other hosts (staging, a local stub).
    pub fn with_base_urls(mut self, auth_base: impl Into<String>, api_base: impl Into<String>) -> Self {
        self.auth_base = auth_base.into().trim_end_matches('/').to_string();
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn listing_url(&self, req: &ListingRequest) -> String {
        listing_url(&self.api_base, req)
    }

    fn access_token(&self) -> Result<String> {
        let mut slot = self.token.lock();
        if let Some(t) = slot.as_ref() {
            if Instant::now() < t.expires_at {
                return Ok(t.value.clone());
            }
        }

        let url = format!("{}/api/v1/access_token", self.auth_base);
        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.creds.client_id, Some(&self.creds.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.creds.username.as_str()),
                ("password", self.creds.password.as_str()),
            ])
            .send()
            .with_context(|| format!("POST {}", url))?;
        let body: TokenResponse = decode(resp, &url)?;
        if let Some(err) = body.error {
            bail!("token request rejected: {}", err);
        }
        let value = body.access_token.ok_or_else(|| anyhow!("token response has no access_token"))?;
        // Refresh a minute early so a long batch doesn't straddle expiry.
        let ttl = body.expires_in.unwrap_or(3600).saturating_sub(60).max(1);
        *slot = Some(Token { value: value.clone(), expires_at: Instant::now() + Duration::from_secs(ttl) });
        tracing::debug!(ttl_secs = ttl, "obtained access token");
        Ok(value)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let token = self.access_token()?;
        let resp = self.http.get(url).bearer_auth(&token).send().with_context(|| format!("GET {}", url))?;
        decode(resp, url)
    }
}

impl RedditApi for HttpApi {
    fn me(&self) -> Result<Option<String>> {
        let url = format!("{}/api/v1/me", self.api_base);
        let id: Identity = self.get_json(&url)?;
        Ok(id.name.filter(|n| !n.is_empty()))
    }

    fn listing(&self, req: &ListingRequest) -> Result<Vec<LinkData>> {
        let url = self.listing_url(req);
        let page: Listing<Thing<LinkData>> = self.get_json(&url)?;
        Ok(page.data.children.into_iter().map(|t| t.data).collect())
    }

    fn comments(&self, post_id: &str, sort: CommentSort, limit: usize) -> Result<Vec<CommentThing>> {
        let url = comments_url(&self.api_base, post_id, sort, limit);
        let CommentsResponse(_, comments) = self.get_json(&url)?;
        Ok(comments.data.children)
    }
}

pub fn listing_url(api_base: &str, req: &ListingRequest) -> String {
    let mut url = format!(
        "{}/r/{}/{}?limit={}&raw_json=1",
        api_base.trim_end_matches('/'),
        req.subreddit,
        req.sort.as_str(),
        req.limit
    );
    if let Some(t) = req.sort.time_filter() {
        url.push_str("&t=");
        url.push_str(t.as_str());
    }
    if let Some(after) = req.after.as_deref().filter(|a| !a.is_empty()) {
        url.push_str("&after=");
        url.push_str(after);
    }
    url
}

/// `post_id` may be a bare id or a `t3_` fullname.
pub fn comments_url(api_base: &str, post_id: &str, sort: CommentSort, limit: usize) -> String {
    let id = post_id.strip_prefix("t3_").unwrap_or(post_id);
    format!(
        "{}/comments/{}?sort={}&depth=1&limit={}&raw_json=1",
        api_base.trim_end_matches('/'),
        id,
        sort.as_str(),
        limit.max(1)
    )
}

fn decode<T: DeserializeOwned>(resp: Response, url: &str) -> Result<T> {
    log_rate_limit(&resp);
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        bail!("{} returned {}: {}", url, status, snippet);
    }
    resp.json::<T>().with_context(|| format!("decode response from {}", url))
}

fn log_rate_limit(resp: &Response) {
    let header = |k: &str| resp.headers().get(k).and_then(|v| v.to_str().ok()).map(str::to_string);
    if let (Some(remaining), Some(reset)) = (header("x-ratelimit-remaining"), header("x-ratelimit-reset")) {
        tracing::debug!(%remaining, reset_secs = %reset, "rate limit");
    }
}
