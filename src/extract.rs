//! Field extraction: upstream wire records -> `Post` / `Comment`.
//! Missing fields are recovered here (author sentinel, blank downvotes), never raised.

use crate::client::RedditApi;
use crate::config::CommentSort;
use crate::models::{Comment, Post, AUTHOR_SENTINEL};
use crate::reddit_types::{CommentData, CommentThing, LinkData};
use anyhow::{Context, Result};

/// Null, empty and whitespace-only authors all map to the sentinel.
pub fn author_or_sentinel(author: Option<String>) -> String {
    match author {
        Some(a) if !a.trim().is_empty() => a,
        _ => AUTHOR_SENTINEL.to_string(),
    }
}

/// Downvotes are not exposed upstream. For posts, estimate from `ups` and
/// `upvote_ratio`; otherwise fall back to whatever `downs` the API sent.
pub fn estimate_post_downs(ups: Option<i64>, upvote_ratio: Option<f64>, downs: Option<i64>) -> Option<i64> {
    match (ups, upvote_ratio) {
        (Some(u), Some(r)) if r > 0.0 && r <= 1.0 && u >= 0 => {
            Some((u as f64 * (1.0 - r) / r).round() as i64)
        }
        _ => downs,
    }
}

pub fn comment_from_data(c: CommentData) -> Comment {
    Comment {
        id: c.id,
        author: author_or_sentinel(c.author),
        body: c.body.unwrap_or_default(),
        ups: c.ups,
        downs: c.downs,
        score: c.score,
    }
}

/// Drop "more" stubs, then keep the first `limit` comments in upstream order.
pub fn comments_from_nodes(nodes: Vec<CommentThing>, limit: usize) -> Vec<Comment> {
    nodes
        .into_iter()
        .filter_map(|n| match n {
            CommentThing::Comment(c) => Some(c),
            CommentThing::More(_) => None,
        })
        .take(limit)
        .map(comment_from_data)
        .collect()
}

pub fn post_from_link(link: LinkData, comments: Vec<Comment>) -> Post {
    let fullname = link.fullname();
    let downs = estimate_post_downs(link.ups, link.upvote_ratio, link.downs);
    Post {
        fullname,
        title: link.title,
        author: author_or_sentinel(link.author),
        selftext: link.selftext.unwrap_or_default(),
        score: link.score.unwrap_or(0),
        ups: link.ups.unwrap_or(0),
        downs,
        url: link.url.unwrap_or_default(),
        comments,
    }
}

/// Fetch one post's comments and assemble the record.
pub fn extract_post<A: RedditApi>(api: &A, link: LinkData, sort: CommentSort, limit: usize) -> Result<Post> {
    let comments = if limit == 0 {
        Vec::new()
    } else {
        let nodes = api
            .comments(&link.id, sort, limit)
            .with_context(|| format!("fetch comments for {}", link.fullname()))?;
        comments_from_nodes(nodes, limit)
    };
    Ok(post_from_link(link, comments))
}
