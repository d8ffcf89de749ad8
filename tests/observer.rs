//! Integration tests for the [`mkv_nav::Observer`] callback: skipping a
//! subtree mid-walk and aborting the parse outright.

mod common;

use std::io::Cursor;

use mkv_nav::{parse_with_observer, Error, Handle, Observer, ParseOptions, Reply, Tree, Value};

use common::*;

fn two_track_entries() -> Vec<u8> {
    let a = container(TRACK_ENTRY, &[uint_el(TRACK_NUMBER, 1), uint_el(TRACK_TYPE, 1), string_el(CODEC_ID, "V_A")]);
    let b = container(TRACK_ENTRY, &[uint_el(TRACK_NUMBER, 2), uint_el(TRACK_TYPE, 1), string_el(CODEC_ID, "V_B")]);
    container(TRACKS, &[a, b])
}

fn sample_bytes() -> Vec<u8> {
    let segment = container(SEGMENT, &[two_track_entries()]);
    let mut bytes = ebml_header();
    bytes.extend(segment);
    bytes
}

struct SkipFirstTrackEntry {
    seen: usize,
}

impl Observer for SkipFirstTrackEntry {
    fn on_element(&mut self, tree: &Tree, handle: Handle) -> Reply {
        if tree.get(handle).name == "TrackEntry" {
            self.seen += 1;
            if self.seen == 1 {
                return Reply::Skip;
            }
        }
        Reply::Continue
    }
}

#[test]
fn skip_reply_prevents_descent_but_lets_the_walk_continue() {
    let mut cursor = Cursor::new(sample_bytes());
    let options = ParseOptions::default().want("Segment/Tracks");
    let mut observer = SkipFirstTrackEntry { seen: 0 };
    let tree = parse_with_observer(&mut cursor, &options, &mut observer).unwrap();

    let segment_h = tree.top_level[1];
    let tracks_h = tree.get(segment_h).children.get("Tracks").unwrap();
    let all_entries = tree.get(tracks_h).children.get_all("TrackEntry");
    assert_eq!(all_entries.len(), 2);

    let first = all_entries[0];
    assert!(tree.get(first).children.is_empty(), "skipped entry's children were never read");

    let second = all_entries[1];
    let number_h = tree.get(second).children.get("TrackNumber").unwrap();
    assert!(matches!(tree.get(number_h).value, Value::Uint(2)));
    let codec_h = tree.get(second).children.get("CodecID").unwrap();
    assert!(matches!(&tree.get(codec_h).value, Value::String(s) if s == "V_B"));

    assert_eq!(observer.seen, 2);
}

struct AbortOnSecondTrackEntry {
    seen: usize,
}

impl Observer for AbortOnSecondTrackEntry {
    fn on_element(&mut self, tree: &Tree, handle: Handle) -> Reply {
        if tree.get(handle).name == "TrackEntry" {
            self.seen += 1;
            if self.seen == 2 {
                return Reply::Abort;
            }
        }
        Reply::Continue
    }
}

#[test]
fn abort_reply_stops_the_parse_with_an_error() {
    let mut cursor = Cursor::new(sample_bytes());
    let options = ParseOptions::default().want("Segment/Tracks");
    let mut observer = AbortOnSecondTrackEntry { seen: 0 };
    let result = parse_with_observer(&mut cursor, &options, &mut observer);

    assert!(matches!(result, Err(Error::Aborted)));
    assert_eq!(observer.seen, 2);
}
