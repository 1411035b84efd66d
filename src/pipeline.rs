use crate::auth::{authenticate, AuthStatus};
use crate::client::{ListingRequest, RedditApi};
use crate::config::{validate_subreddit, CommentSort, ListingSort, ScrapeOptions};
use crate::extract::extract_post;
use crate::flatten::flatten;
use crate::progress::make_batch_progress;
use crate::reddit_types::LinkData;
use crate::util::init_tracing_once;
use crate::writer::CsvAppender;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;

/// Run context: the upstream client plus options. Built once per run.
pub struct Scraper<A> {
    api: A,
    pub(crate) opts: ScrapeOptions,
}

/// Result of one listing page pushed through extract → flatten → append.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub posts: usize,
    pub rows_written: usize,
    /// Fullname of the last post on the page; `None` when the page was empty.
    pub next_after: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: usize,
    pub posts: usize,
    pub rows_written: usize,
    pub last_after: Option<String>,
}

/// Driver loop states.
#[derive(Debug)]
enum DriverState {
    Running { iteration: usize, after: Option<String> },
    Done,
}

impl<A: RedditApi> Scraper<A> {
    pub fn new(api: A) -> Self {
        Self { api, opts: ScrapeOptions::default() }
    }

    // -------- Builder methods --------
    pub fn options(mut self, opts: ScrapeOptions) -> Self { self.opts = opts; self }
    pub fn subreddit(mut self, sub: impl AsRef<str>) -> Self { self.opts = self.opts.with_subreddit(sub); self }
    pub fn sort(mut self, sort: ListingSort) -> Self { self.opts = self.opts.with_sort(sort); self }
    pub fn comment_sort(mut self, sort: CommentSort) -> Self { self.opts = self.opts.with_comment_sort(sort); self }
    pub fn comments_limit(mut self, n: usize) -> Self { self.opts = self.opts.with_comments_limit(n); self }
    pub fn batch_size(mut self, n: usize) -> Self { self.opts = self.opts.with_batch_size(n); self }
    pub fn total_posts(mut self, n: usize) -> Self { self.opts = self.opts.with_total_posts(n); self }
    pub fn sleep(mut self, d: Duration) -> Self { self.opts = self.opts.with_sleep(d); self }
    pub fn output(mut self, path: impl AsRef<Path>) -> Self { self.opts = self.opts.with_output(path); self }
    pub fn dedupe(mut self, yes: bool) -> Self { self.opts = self.opts.with_dedupe(yes); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_label(mut self, label: impl Into<String>) -> Self { self.opts = self.opts.with_progress_label(label); self }

    pub fn opts(&self) -> &ScrapeOptions {
        &self.opts
    }

    /// Identity check. Never fails; see `AuthStatus`.
    pub fn authenticate(&self) -> AuthStatus {
        init_tracing_once();
        authenticate(&self.api)
    }

    /// Paginator: one listing page after `after`. API errors propagate.
    pub fn fetch_page(&self, after: Option<&str>) -> Result<Vec<LinkData>> {
        validate_subreddit(&self.opts.subreddit)?;
        let req = ListingRequest {
            subreddit: self.opts.subreddit.clone(),
            sort: self.opts.sort,
            after: after.map(str::to_string),
            limit: self.opts.batch_size,
        };
        self.api
            .listing(&req)
            .with_context(|| format!("fetch r/{} {} page (after={:?})", req.subreddit, req.sort, req.after))
    }

    /// One page through extract → flatten → append. Rows are flushed before returning.
    pub fn fetch_batch(&self, after: Option<&str>, out: &mut CsvAppender) -> Result<BatchOutcome> {
        let links = self.fetch_page(after)?;
        let next_after = links.last().map(LinkData::fullname);

        let mut posts = Vec::with_capacity(links.len());
        for link in links {
            posts.push(extract_post(&self.api, link, self.opts.comment_sort, self.opts.comments_limit)?);
        }

        let rows = flatten(&posts);
        let rows_written = out.append(&rows)?;
        tracing::info!(
            posts = posts.len(),
            rows = rows_written,
            "Scraping complete for {} posts. Data saved to '{}'.",
            posts.len(),
            out.path().display()
        );

        Ok(BatchOutcome { posts: posts.len(), rows_written, next_after })
    }

    /// Driver loop: `iterations()` batches, cursor carried forward, fixed pause
    /// between batches. Short or empty pages do not stop the loop.
    pub fn run(&self) -> Result<RunSummary> {
        init_tracing_once();
        // Builders only normalize; reject bad names before the output file is touched.
        validate_subreddit(&self.opts.subreddit)?;
        let iterations = self.opts.iterations();
        let mut out = CsvAppender::open(&self.opts.output, self.opts.dedupe)?;

        tracing::info!(
            subreddit = %self.opts.subreddit,
            sort = %self.opts.sort,
            comment_sort = %self.opts.comment_sort,
            batches = iterations,
            batch_size = self.opts.batch_size,
            output = %self.opts.output.display(),
            "starting scrape"
        );

        let pb = if self.opts.progress {
            Some(make_batch_progress(iterations as u64, self.opts.progress_label.as_deref()))
        } else {
            None
        };

        let mut summary = RunSummary::default();
        let mut state = if iterations == 0 { DriverState::Done } else { DriverState::Running { iteration: 0, after: None } };

        while let DriverState::Running { iteration, after } = state {
            let batch = self.fetch_batch(after.as_deref(), &mut out)?;
            if batch.posts == 0 {
                tracing::warn!(iteration, "listing page was empty; cursor resets");
            }

            summary.batches += 1;
            summary.posts += batch.posts;
            summary.rows_written += batch.rows_written;
            summary.last_after = batch.next_after.clone();
            if let Some(pb) = &pb { pb.inc(1); }

            let next = iteration + 1;
            state = if next < iterations {
                tracing::info!("Fetched {} posts. Waiting {:?} to avoid rate limit...", batch.posts, self.opts.sleep);
                if !self.opts.sleep.is_zero() {
                    std::thread::sleep(self.opts.sleep);
                }
                DriverState::Running { iteration: next, after: batch.next_after }
            } else {
                DriverState::Done
            };
        }

        if let Some(pb) = pb { pb.finish_with_message("done"); }
        if out.rows_skipped() > 0 {
            tracing::info!(skipped = out.rows_skipped(), "duplicate rows skipped");
        }
        tracing::info!(
            batches = summary.batches,
            posts = summary.posts,
            rows = summary.rows_written,
            "All posts have been scraped and saved."
        );
        Ok(summary)
    }
}
