//! Integration tests for [`mkv_nav::build_index`]: the cheap
//! Cues-backed path, and the fallback Cluster-scanning path.

mod common;

use std::io::Cursor;

use mkv_nav::{build_index, parse, IndexMode, ParseOptions};

use common::*;

#[test]
fn cfr_index_is_built_from_materialized_cues() {
    let info = container(INFO, &[uint_el(TIMECODE_SCALE, 1_000_000)]);
    let tracks = container(TRACKS, &[container(TRACK_ENTRY, &[uint_el(TRACK_NUMBER, 1), uint_el(TRACK_TYPE, 1), string_el(CODEC_ID, "V_TEST")])]);
    let cue_track_positions = container(CUE_TRACK_POSITIONS, &[uint_el(CUE_TRACK, 1), uint_el(CUE_CLUSTER_POSITION, 123)]);
    let cue_point = container(CUE_POINT, &[uint_el(CUE_TIME, 40), cue_track_positions]);
    let cues = container(CUES, &[cue_point]);

    let segment = container(SEGMENT, &[info, tracks, cues]);
    let mut bytes = ebml_header();
    bytes.extend(segment);

    let mut cursor = Cursor::new(bytes);
    let options = ParseOptions::default().want("Segment/Cues");
    let tree = parse(&mut cursor, &options).unwrap();
    let segment_h = tree.top_level[1];

    let index = build_index(&mut cursor, &tree, segment_h, None).unwrap();
    assert_eq!(index.mode, IndexMode::Cfr);
    assert_eq!(index.entries.len(), 1);
    let entry = index.entries[0];
    assert_eq!(entry.track_number, 1);
    assert_eq!(entry.timecode_ns, 40_000_000);
    assert!(entry.keyframe);
    let segment_payload_offset = tree.get(segment_h).payload_offset();
    assert_eq!(entry.cluster_offset, segment_payload_offset + 123);
}

#[test]
fn vfr_index_falls_back_to_scanning_clusters_when_there_are_no_cues() {
    let info = container(INFO, &[uint_el(TIMECODE_SCALE, 1_000_000)]);
    let tracks = container(TRACKS, &[container(TRACK_ENTRY, &[uint_el(TRACK_NUMBER, 1), uint_el(TRACK_TYPE, 1), string_el(CODEC_ID, "V_TEST")])]);

    let cluster_a = container(
        CLUSTER,
        &[
            uint_el(CLUSTER_TIMECODE, 0),
            el(SIMPLE_BLOCK, &simple_block_payload(1, 0, true)),
            el(SIMPLE_BLOCK, &simple_block_payload(1, 40, false)),
        ],
    );
    let cluster_b = container(CLUSTER, &[uint_el(CLUSTER_TIMECODE, 80), el(SIMPLE_BLOCK, &simple_block_payload(1, 0, false))]);

    let segment = container(SEGMENT, &[info, tracks, cluster_a, cluster_b]);
    let mut bytes = ebml_header();
    bytes.extend(segment);

    let mut cursor = Cursor::new(bytes);
    let options = ParseOptions::default();
    let tree = parse(&mut cursor, &options).unwrap();
    let segment_h = tree.top_level[1];

    let index = build_index(&mut cursor, &tree, segment_h, None).unwrap();
    assert_eq!(index.mode, IndexMode::Vfr);
    assert_eq!(index.entries.len(), 3);

    let mut by_time: Vec<_> = index.entries.iter().collect();
    by_time.sort_by_key(|e| e.timecode_ns);
    assert_eq!(by_time[0].timecode_ns, 0);
    assert!(by_time[0].keyframe);
    assert_eq!(by_time[1].timecode_ns, 40_000_000);
    assert!(!by_time[1].keyframe);
    assert_eq!(by_time[2].timecode_ns, 80_000_000);
    assert!(!by_time[2].keyframe);

    assert_eq!(index.spans.len(), 1);
    assert!((index.spans[0].fps - 25.0).abs() < 0.001);
    assert_eq!(index.spans[0].start_frame, 0);
    assert_eq!(index.spans[0].start_time, 0);
}

#[test]
fn track_filter_restricts_cfr_entries_to_one_track() {
    let info = container(INFO, &[uint_el(TIMECODE_SCALE, 1_000_000)]);
    let positions_1 = container(CUE_TRACK_POSITIONS, &[uint_el(CUE_TRACK, 1), uint_el(CUE_CLUSTER_POSITION, 0)]);
    let positions_2 = container(CUE_TRACK_POSITIONS, &[uint_el(CUE_TRACK, 2), uint_el(CUE_CLUSTER_POSITION, 0)]);
    let cue_point = container(CUE_POINT, &[uint_el(CUE_TIME, 0), positions_1, positions_2]);
    let cues = container(CUES, &[cue_point]);
    let segment = container(SEGMENT, &[info, cues]);
    let mut bytes = ebml_header();
    bytes.extend(segment);

    let mut cursor = Cursor::new(bytes);
    let options = ParseOptions::default().want("Segment/Cues");
    let tree = parse(&mut cursor, &options).unwrap();
    let segment_h = tree.top_level[1];

    let index = build_index(&mut cursor, &tree, segment_h, Some(2)).unwrap();
    assert_eq!(index.entries.len(), 1);
    assert_eq!(index.entries[0].track_number, 2);
}
