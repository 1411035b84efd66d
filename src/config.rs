use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

/// Upstream listing page ceiling.
pub const MAX_BATCH_SIZE: usize = 100;

/// Script-app credentials for the password grant.
#[derive(Clone, Default)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Read the five `REDDIT_*` variables. Missing ones become empty strings;
    /// the identity check reports the problem later instead of failing here.
    pub fn from_env() -> Self {
        let var = |k: &str| std::env::var(k).unwrap_or_default();
        let creds = Self {
            client_id: var("REDDIT_CLIENT_ID"),
            client_secret: var("REDDIT_CLIENT_SECRET"),
            user_agent: var("REDDIT_USER_AGENT"),
            username: var("REDDIT_USERNAME"),
            password: var("REDDIT_PASSWORD"),
        };
        for (name, v) in [
            ("REDDIT_CLIENT_ID", &creds.client_id),
            ("REDDIT_CLIENT_SECRET", &creds.client_secret),
            ("REDDIT_USER_AGENT", &creds.user_agent),
            ("REDDIT_USERNAME", &creds.username),
            ("REDDIT_PASSWORD", &creds.password),
        ] {
            if v.is_empty() {
                tracing::warn!("{} is not set", name);
            }
        }
        creds
    }
}

// Keep secrets out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("user_agent", &self.user_agent)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Time window for the `top` listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeFilter {
    Hour,
    Day,
    Week,
    Month,
    Year,
    All,
}

impl TimeFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeFilter::Hour => "hour",
            TimeFilter::Day => "day",
            TimeFilter::Week => "week",
            TimeFilter::Month => "month",
            TimeFilter::Year => "year",
            TimeFilter::All => "all",
        }
    }
}

impl FromStr for TimeFilter {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_lowercase().as_str() {
            "hour" => TimeFilter::Hour,
            "day" => TimeFilter::Day,
            "week" => TimeFilter::Week,
            "month" => TimeFilter::Month,
            "year" => TimeFilter::Year,
            "all" => TimeFilter::All,
            other => bail!("unknown time filter {:?} (expected hour|day|week|month|year|all)", other),
        })
    }
}

/// Listing order for the subreddit page. The modes are mutually exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListingSort {
    Hot,
    New,
    Rising,
    Top(TimeFilter),
}

impl ListingSort {
    /// Path segment used by the listing endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            ListingSort::Hot => "hot",
            ListingSort::New => "new",
            ListingSort::Rising => "rising",
            ListingSort::Top(_) => "top",
        }
    }

    pub fn time_filter(self) -> Option<TimeFilter> {
        match self {
            ListingSort::Top(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for ListingSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.time_filter() {
            Some(t) => write!(f, "top:{}", t.as_str()),
            None => f.write_str(self.as_str()),
        }
    }
}

/// Accepts `hot`, `new`, `rising`, `top` (all time) and `top:<window>`.
impl FromStr for ListingSort {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        let (head, tail) = match s.split_once(':') {
            Some((h, t)) => (h, Some(t)),
            None => (s.as_str(), None),
        };
        match (head, tail) {
            ("hot", None) => Ok(ListingSort::Hot),
            ("new", None) => Ok(ListingSort::New),
            ("rising", None) => Ok(ListingSort::Rising),
            ("top", None) => Ok(ListingSort::Top(TimeFilter::All)),
            ("top", Some(t)) => Ok(ListingSort::Top(t.parse()?)),
            _ => Err(anyhow!("unknown listing sort {:?} (expected hot|new|rising|top[:window])", s)),
        }
    }
}

/// Comment ordering requested from the comment-tree endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommentSort {
    Best,
    Top,
    New,
    Controversial,
    Old,
    Qa,
}

impl CommentSort {
    pub fn as_str(self) -> &'static str {
        match self {
            CommentSort::Best => "confidence",
            CommentSort::Top => "top",
            CommentSort::New => "new",
            CommentSort::Controversial => "controversial",
            CommentSort::Old => "old",
            CommentSort::Qa => "qa",
        }
    }
}

impl fmt::Display for CommentSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // "confidence" is the wire name of "best".
        match self {
            CommentSort::Best => f.write_str("best"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl FromStr for CommentSort {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_lowercase().as_str() {
            "best" | "confidence" => CommentSort::Best,
            "top" => CommentSort::Top,
            "new" => CommentSort::New,
            "controversial" => CommentSort::Controversial,
            "old" => CommentSort::Old,
            "qa" | "q&a" => CommentSort::Qa,
            other => bail!("unknown comment sort {:?}", other),
        })
    }
}

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct ScrapeOptions {
    pub subreddit: String,            // normalized, no "r/"
    pub sort: ListingSort,
    pub comment_sort: CommentSort,
    pub comments_limit: usize,        // top-level comments kept per post
    pub batch_size: usize,            // posts per listing page, 1..=100
    pub total_posts: usize,           // target across all batches
    pub sleep: Duration,              // pause between batches
    pub output: PathBuf,
    pub dedupe: bool,                 // skip rows already recorded in the key index
    pub progress: bool,               // show progress bar
    pub progress_label: Option<String>,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            subreddit: "OpiatesRecovery".to_string(),
            sort: ListingSort::Hot,
            comment_sort: CommentSort::Best,
            comments_limit: 3,
            batch_size: 100,
            total_posts: 1000,
            sleep: Duration::from_secs(30),
            output: PathBuf::from("reddit_hot_posts_and_best_comments_with_author.csv"),
            dedupe: false,
            progress: true,
            progress_label: None,
        }
    }
}

impl ScrapeOptions {
    /// Defaults overlaid with any `RSCRAPE_*` variables that are set.
    pub fn from_env() -> Result<Self> {
        Self::default().overlay_env(|k| std::env::var(k).ok())
    }

    /// Overlay values from an arbitrary lookup (env in production, a map in tests).
    pub fn overlay_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("RSCRAPE_SUBREDDIT") {
            self = self.with_subreddit(v);
        }
        if let Some(v) = get("RSCRAPE_SORT") {
            self.sort = v.parse().context("RSCRAPE_SORT")?;
        }
        if let Some(v) = get("RSCRAPE_COMMENT_SORT") {
            self.comment_sort = v.parse().context("RSCRAPE_COMMENT_SORT")?;
        }
        if let Some(v) = get("RSCRAPE_COMMENTS_LIMIT") {
            self = self.with_comments_limit(parse_num(&v, "RSCRAPE_COMMENTS_LIMIT")?);
        }
        if let Some(v) = get("RSCRAPE_BATCH_SIZE") {
            self = self.with_batch_size(parse_num(&v, "RSCRAPE_BATCH_SIZE")?);
        }
        if let Some(v) = get("RSCRAPE_TOTAL_POSTS") {
            self = self.with_total_posts(parse_num(&v, "RSCRAPE_TOTAL_POSTS")?);
        }
        if let Some(v) = get("RSCRAPE_OUTPUT") {
            self = self.with_output(v);
        }
        if let Some(v) = get("RSCRAPE_SLEEP_SECS") {
            self = self.with_sleep(Duration::from_secs(parse_num(&v, "RSCRAPE_SLEEP_SECS")? as u64));
        }
        if let Some(v) = get("RSCRAPE_DEDUPE") {
            self.dedupe = parse_bool(&v, "RSCRAPE_DEDUPE")?;
        }
        if let Some(v) = get("RSCRAPE_PROGRESS") {
            self.progress = parse_bool(&v, "RSCRAPE_PROGRESS")?;
        }
        validate_subreddit(&self.subreddit)?;
        Ok(self)
    }

    pub fn with_subreddit(mut self, sub: impl AsRef<str>) -> Self {
        self.subreddit = normalize_subreddit(sub.as_ref());
        self
    }
    pub fn with_sort(mut self, sort: ListingSort) -> Self {
        self.sort = sort;
        self
    }
    pub fn with_comment_sort(mut self, sort: CommentSort) -> Self {
        self.comment_sort = sort;
        self
    }
    pub fn with_comments_limit(mut self, n: usize) -> Self {
        self.comments_limit = n;
        self
    }
    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n.clamp(1, MAX_BATCH_SIZE);
        self
    }
    pub fn with_total_posts(mut self, n: usize) -> Self {
        self.total_posts = n;
        self
    }
    pub fn with_sleep(mut self, d: Duration) -> Self {
        self.sleep = d;
        self
    }
    pub fn with_output(mut self, path: impl AsRef<Path>) -> Self {
        self.output = path.as_ref().to_path_buf();
        self
    }
    pub fn with_dedupe(mut self, yes: bool) -> Self {
        self.dedupe = yes;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = Some(label.into());
        self
    }

    /// Number of listing pages to request: ceil(total_posts / batch_size).
    pub fn iterations(&self) -> usize {
        self.total_posts.div_ceil(self.batch_size.max(1))
    }
}

/// Trim and strip an optional `r/` or `/r/` prefix. Case is preserved.
pub fn normalize_subreddit(s: &str) -> String {
    let s = s.trim().trim_start_matches('/');
    let s = s.strip_prefix("r/").or_else(|| s.strip_prefix("R/")).unwrap_or(s);
    s.trim_end_matches('/').to_string()
}

pub fn validate_subreddit(name: &str) -> Result<()> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]{2,21}$").expect("static regex"));
    if re.is_match(name) {
        Ok(())
    } else {
        bail!("invalid subreddit name {:?}", name)
    }
}

fn parse_num(v: &str, var: &str) -> Result<usize> {
    v.parse::<usize>().with_context(|| format!("{} must be a non-negative integer, got {:?}", var, v))
}

fn parse_bool(v: &str, var: &str) -> Result<bool> {
    match v.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("{} must be a boolean, got {:?}", var, v),
    }
}
