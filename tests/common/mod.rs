#![allow(dead_code)]

use anyhow::{anyhow, Result};
use rscrape::{CommentData, CommentSort, CommentThing, LinkData, ListingRequest, MoreData, RedditApi};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;

/// Scripted upstream: serves `pages` in order (empty once exhausted), comment
/// nodes per post id, and records every request it sees.
#[derive(Default)]
pub struct MockApi {
    pub identity: Option<String>,
    pub identity_error: bool,
    pub pages: Vec<Vec<LinkData>>,
    pub comments: HashMap<String, Vec<CommentThing>>,
    /// Fail the listing call with this zero-based index.
    pub fail_listing_at: Option<usize>,

    pub listing_calls: RefCell<Vec<ListingRequest>>,
    pub comment_calls: RefCell<Vec<(String, CommentSort, usize)>>,
    pub page_idx: Cell<usize>,
}

impl MockApi {
    pub fn with_pages(pages: Vec<Vec<LinkData>>) -> Self {
        Self { pages, ..Default::default() }
    }

    pub fn with_comments(mut self, post_id: &str, nodes: Vec<CommentThing>) -> Self {
        self.comments.insert(post_id.to_string(), nodes);
        self
    }

    /// The `after` cursor each listing call received, in call order.
    pub fn afters(&self) -> Vec<Option<String>> {
        self.listing_calls.borrow().iter().map(|r| r.after.clone()).collect()
    }
}

impl RedditApi for MockApi {
    fn me(&self) -> Result<Option<String>> {
        if self.identity_error {
            return Err(anyhow!("401 Unauthorized"));
        }
        Ok(self.identity.clone())
    }

    fn listing(&self, req: &ListingRequest) -> Result<Vec<LinkData>> {
        let idx = self.page_idx.get();
        self.page_idx.set(idx + 1);
        self.listing_calls.borrow_mut().push(req.clone());
        if self.fail_listing_at == Some(idx) {
            return Err(anyhow!("429 Too Many Requests"));
        }
        Ok(self.pages.get(idx).cloned().unwrap_or_default())
    }

    fn comments(&self, post_id: &str, sort: CommentSort, limit: usize) -> Result<Vec<CommentThing>> {
        self.comment_calls.borrow_mut().push((post_id.to_string(), sort, limit));
        Ok(self.comments.get(post_id).cloned().unwrap_or_default())
    }
}

pub fn link(id: &str, title: &str, author: Option<&str>) -> LinkData {
    LinkData {
        id: id.to_string(),
        name: Some(format!("t3_{id}")),
        title: title.to_string(),
        author: author.map(str::to_string),
        selftext: Some(format!("body of {title}")),
        score: Some(10),
        ups: Some(10),
        downs: Some(0),
        upvote_ratio: None,
        url: Some(format!("https://www.reddit.com/r/OpiatesRecovery/comments/{id}/")),
    }
}

pub fn comment(id: &str, author: Option<&str>, body: &str, score: i64) -> CommentThing {
    CommentThing::Comment(CommentData {
        id: id.to_string(),
        author: author.map(str::to_string),
        body: Some(body.to_string()),
        ups: Some(score),
        downs: Some(0),
        score: Some(score),
    })
}

pub fn more(n: usize) -> CommentThing {
    CommentThing::More(MoreData {
        count: Some(n as i64),
        children: (0..n).map(|i| format!("m{i}")).collect(),
    })
}

pub fn scratch_csv(name: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    (dir, path)
}

/// Header + records of a CSV file as plain strings.
pub fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(File::open(path).unwrap());
    let header = rdr.headers().unwrap().iter().map(str::to_string).collect();
    let rows = rdr
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    (header, rows)
}

/// Count of raw lines equal to the header line (guards against repeated headers).
pub fn header_lines(path: &Path) -> usize {
    let text = std::fs::read_to_string(path).unwrap();
    text.lines().filter(|l| l.starts_with("title,post_author,")).count()
}

/// Canned reply for one request: (status, JSON body). Arguments are method and path+query.
pub type Route = dyn Fn(&str, &str) -> (u16, String) + Send + Sync;

/// Minimal HTTP/1.1 server on 127.0.0.1 that answers every request through `route`
/// and logs `"METHOD /path?query"` lines. One request per connection.
pub struct StubServer {
    pub base: String,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub fn start(route: impl Fn(&str, &str) -> (u16, String) + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let log = Arc::new(Mutex::new(Vec::new()));
        let route: Arc<Route> = Arc::new(route);

        let thread_log = Arc::clone(&log);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let _ = serve_one(stream, &*route, &thread_log);
            }
        });
        Self { base, log }
    }

    pub fn requests(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.requests().iter().filter(|r| r.starts_with(prefix)).count()
    }
}

fn serve_one(stream: TcpStream, route: &Route, log: &Mutex<Vec<String>>) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 || line == "\r\n" || line == "\n" {
            break;
        }
        if let Some((k, v)) = line.split_once(':') {
            if k.trim().eq_ignore_ascii_case("content-length") {
                content_length = v.trim().parse().unwrap_or(0);
            }
        }
    }
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body)?;

    log.lock().unwrap().push(format!("{method} {target}"));
    let (status, payload) = route(&method, &target);
    let reason = if status == 200 { "OK" } else { "Error" };
    let mut out = stream;
    write!(
        out,
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    )?;
    out.flush()
}
