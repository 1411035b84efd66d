//! Wire types for the parts of the Reddit JSON API the scraper reads.
//! Extra fields are ignored by serde; everything that can be missing or null is optional.

use serde::Deserialize;

/// `{"kind": "Listing", "data": {"after": .., "children": [..]}}`
#[derive(Debug, Deserialize)]
pub struct Listing<T> {
    pub data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
pub struct ListingData<T> {
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default = "Vec::new")]
    pub children: Vec<T>,
}

/// Generic `{"kind": "t3", "data": {..}}` wrapper.
#[derive(Debug, Deserialize)]
pub struct Thing<T> {
    pub data: T,
}

/// A submission (`t3`).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LinkData {
    pub id: String,
    /// Fullname, e.g. `t3_abc123`. Used as the `after` cursor.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub selftext: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub ups: Option<i64>,
    #[serde(default)]
    pub downs: Option<i64>,
    #[serde(default)]
    pub upvote_ratio: Option<f64>,
    #[serde(default)]
    pub url: Option<String>,
}

impl LinkData {
    pub fn fullname(&self) -> String {
        match &self.name {
            Some(n) if !n.is_empty() => n.clone(),
            _ => format!("t3_{}", self.id),
        }
    }
}

/// A node of the comment tree: either a real comment or a "load more" stub.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum CommentThing {
    #[serde(rename = "t1")]
    Comment(CommentData),
    #[serde(rename = "more")]
    More(MoreData),
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CommentData {
    pub id: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub ups: Option<i64>,
    #[serde(default)]
    pub downs: Option<i64>,
    #[serde(default)]
    pub score: Option<i64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MoreData {
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub children: Vec<String>,
}

/// `GET /comments/{id}` answers with `[post listing, comment listing]`.
#[derive(Debug, Deserialize)]
pub struct CommentsResponse(
    pub serde::de::IgnoredAny,
    pub Listing<CommentThing>,
);

/// `GET /api/v1/me`
#[derive(Debug, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub name: Option<String>,
}

/// `POST /api/v1/access_token`. Reddit reports bad credentials as a 200 with `error` set.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}
