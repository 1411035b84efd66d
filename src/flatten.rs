use crate::models::{Comment, Post, Row};

/// One row per comment; a comment-less post still yields one row with blank comment fields.
pub fn flatten_post(post: &Post) -> Vec<Row> {
    if post.comments.is_empty() {
        return vec![Row::new(post, &Comment::placeholder())];
    }
    post.comments.iter().map(|c| Row::new(post, c)).collect()
}

pub fn flatten(posts: &[Post]) -> Vec<Row> {
    posts.iter().flat_map(flatten_post).collect()
}
