//! In-memory records produced by the extractor and the flattened output row.

use serde::Serialize;

/// Stand-in for authors that are deleted, removed or simply missing upstream.
pub const AUTHOR_SENTINEL: &str = "[deleted]";

/// Output column order. Stable across runs; appends rely on it.
pub const COLUMNS: [&str; 12] = [
    "title",
    "post_author",
    "selftext",
    "score",
    "ups",
    "downs",
    "url",
    "comment_author",
    "comment_body",
    "comment_ups",
    "comment_downs",
    "comment_score",
];

#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    pub fullname: String, // t3_..., pagination cursor
    pub title: String,
    pub author: String,
    pub selftext: String,
    pub score: i64,
    pub ups: i64,
    pub downs: Option<i64>, // best-effort, often blank
    pub url: String,
    pub comments: Vec<Comment>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub body: String,
    pub ups: Option<i64>,
    pub downs: Option<i64>,
    pub score: Option<i64>,
}

impl Comment {
    /// Blank comment used when a post has no visible comments.
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn is_placeholder(&self) -> bool {
        *self == Self::default()
    }
}

/// One output line: post fields followed by one comment's fields.
/// Field order must match `COLUMNS`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Row {
    pub title: String,
    pub post_author: String,
    pub selftext: String,
    pub score: i64,
    pub ups: i64,
    pub downs: Option<i64>,
    pub url: String,
    pub comment_author: String,
    pub comment_body: String,
    pub comment_ups: Option<i64>,
    pub comment_downs: Option<i64>,
    pub comment_score: Option<i64>,

    #[serde(skip)]
    pub post_fullname: String,
    #[serde(skip)]
    pub comment_id: String,
}

impl Row {
    pub fn new(post: &Post, comment: &Comment) -> Self {
        Self {
            title: post.title.clone(),
            post_author: post.author.clone(),
            selftext: post.selftext.clone(),
            score: post.score,
            ups: post.ups,
            downs: post.downs,
            url: post.url.clone(),
            comment_author: comment.author.clone(),
            comment_body: comment.body.clone(),
            comment_ups: comment.ups,
            comment_downs: comment.downs,
            comment_score: comment.score,
            post_fullname: post.fullname.clone(),
            comment_id: comment.id.clone(),
        }
    }

    /// Dedupe key: post fullname + comment id (empty for placeholder rows).
    pub fn key(&self) -> String {
        format!("{}\t{}", self.post_fullname, self.comment_id)
    }
}
