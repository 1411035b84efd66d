mod config;
mod client;
mod reddit_types;
mod auth;

mod models;
mod extract;
mod flatten;

mod util;
mod progress;
mod dedupe;
mod writer;
mod pipeline;

pub use crate::config::{normalize_subreddit, validate_subreddit, CommentSort, Credentials, ListingSort, ScrapeOptions, TimeFilter, MAX_BATCH_SIZE};
pub use crate::client::{comments_url, listing_url, HttpApi, ListingRequest, RedditApi};
pub use crate::reddit_types::{CommentData, CommentThing, CommentsResponse, Identity, LinkData, Listing, ListingData, MoreData, Thing, TokenResponse};
pub use crate::auth::{authenticate, AuthStatus};

pub use crate::models::{Comment, Post, Row, AUTHOR_SENTINEL, COLUMNS};
pub use crate::extract::{author_or_sentinel, comment_from_data, comments_from_nodes, estimate_post_downs, extract_post, post_from_link};
pub use crate::flatten::{flatten, flatten_post};

// Output sink and opt-in dedupe index.
pub use crate::writer::CsvAppender;
pub use crate::dedupe::KeyIndex;

pub use crate::pipeline::{BatchOutcome, RunSummary, Scraper};

pub use crate::util::init_tracing_once;
