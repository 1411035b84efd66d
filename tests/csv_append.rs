#[path = "common/mod.rs"]
mod common;

use common::*;
use rscrape::{comments_from_nodes, flatten, post_from_link, CsvAppender, KeyIndex, Row, COLUMNS};

fn sample_rows() -> Vec<Row> {
    let p1 = post_from_link(
        link("p1", "Withdrawal tips, please", Some("bob")),
        comments_from_nodes(vec![comment("c1", Some("alice"), "Hydrate, \"really\"\nand rest", 4)], 3),
    );
    let p2 = post_from_link(link("p2", "Day 1", None), vec![]);
    flatten(&[p1, p2])
}

/// New file: header first, then rows in the fixed column order. Blank
/// optional fields stay blank, embedded quotes/newlines survive.
#[test]
fn creates_file_with_header_and_fixed_columns() {
    let (_dir, path) = scratch_csv("out.csv");
    let mut w = CsvAppender::open(&path, false).unwrap();
    assert_eq!(w.append(&sample_rows()).unwrap(), 2);

    let (header, rows) = read_csv(&path);
    assert_eq!(header, COLUMNS.to_vec());
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], "Withdrawal tips, please");
    assert_eq!(rows[0][8], "Hydrate, \"really\"\nand rest");
    assert_eq!(rows[1][1], "[deleted]");
    assert_eq!(&rows[1][7..], &["", "", "", "", ""]);
}

/// Reopening an existing file appends rows without a second header.
#[test]
fn reopen_appends_without_header() {
    let (_dir, path) = scratch_csv("out.csv");
    CsvAppender::open(&path, false).unwrap().append(&sample_rows()).unwrap();
    CsvAppender::open(&path, false).unwrap().append(&sample_rows()).unwrap();

    assert_eq!(header_lines(&path), 1);
    let (header, rows) = read_csv(&path);
    assert_eq!(header, COLUMNS.to_vec());
    assert_eq!(rows.len(), 4);
}

/// Without dedupe the sink is a plain append log: same rows twice, twice in the file.
#[test]
fn duplicates_accumulate_without_dedupe() {
    let (_dir, path) = scratch_csv("out.csv");
    let rows = sample_rows();
    CsvAppender::open(&path, false).unwrap().append(&rows).unwrap();
    CsvAppender::open(&path, false).unwrap().append(&rows).unwrap();

    let (_, got) = read_csv(&path);
    assert_eq!(got.len(), 4);
    assert_eq!(got[0], got[2]);
    assert!(!KeyIndex::path_for(&path).exists());
}

/// With dedupe, keys persist in the sidecar index and repeats are skipped,
/// both across reopen and within one batch.
#[test]
fn dedupe_skips_rows_seen_before() {
    let (_dir, path) = scratch_csv("out.csv");
    let rows = sample_rows();

    let mut first = CsvAppender::open(&path, true).unwrap();
    assert_eq!(first.append(&rows).unwrap(), 2);
    drop(first);

    let mut second = CsvAppender::open(&path, true).unwrap();
    assert_eq!(second.append(&rows).unwrap(), 0);
    assert_eq!(second.rows_skipped(), 2);

    let mut doubled = rows.clone();
    doubled.extend(rows.iter().cloned());
    let (_d2, other) = scratch_csv("other.csv");
    let mut fresh = CsvAppender::open(&other, true).unwrap();
    assert_eq!(fresh.append(&doubled).unwrap(), 2);

    let (_, got) = read_csv(&path);
    assert_eq!(got.len(), 2);
    let idx = KeyIndex::open(&path).unwrap();
    assert_eq!(idx.len(), 2);
    assert!(idx.contains("t3_p1\tc1"));
    assert!(idx.contains("t3_p2\t"));
}

/// An empty batch on a new file still leaves a header, so later appends
/// never produce a headerless file.
#[test]
fn empty_batch_still_writes_header() {
    let (_dir, path) = scratch_csv("nested/dir/out.csv");
    CsvAppender::open(&path, false).unwrap().append(&[]).unwrap();
    CsvAppender::open(&path, false).unwrap().append(&sample_rows()).unwrap();

    assert_eq!(header_lines(&path), 1);
    let (header, rows) = read_csv(&path);
    assert_eq!(header, COLUMNS.to_vec());
    assert_eq!(rows.len(), 2);
}

/// The key index only ever holds keys of rows that made it into the CSV:
/// skipped in-batch repeats add nothing, and every indexed key has a row.
#[test]
fn key_index_tracks_written_rows_only() {
    let (_dir, path) = scratch_csv("out.csv");
    let rows = sample_rows();
    let mut batch = vec![rows[0].clone(), rows[0].clone(), rows[1].clone()];
    batch.push(rows[1].clone());

    let mut w = CsvAppender::open(&path, true).unwrap();
    assert_eq!(w.append(&batch).unwrap(), 2);
    assert_eq!(w.rows_skipped(), 2);
    drop(w);

    let (_, got) = read_csv(&path);
    let idx = KeyIndex::open(&path).unwrap();
    assert_eq!(idx.len(), got.len());
    let sidecar = std::fs::read_to_string(KeyIndex::path_for(&path)).unwrap();
    assert_eq!(sidecar.lines().collect::<Vec<_>>(), vec!["t3_p1\tc1", "t3_p2\t"]);
}
