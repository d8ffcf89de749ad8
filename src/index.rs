//! Frame index builder: constant-frame-rate indexing from Cues when
//! present, falling back to a variable-frame-rate scan of every
//! Cluster's blocks when it isn't.
//!
//! The Cluster scan is a second, minimal TLV walker independent of the
//! main [`crate::reader`]/[`crate::traversal`] pair: it only needs
//! [`crate::vint`]'s codec, not schema resolution or tree-building,
//! since it reads exactly the handful of element types the Matroska
//! block structure defines. This follows the byte-offset/flags-bit style of
//! `frame.rs`'s lacing reader before this rewrite.

use std::collections::HashMap;

use crate::cook;
use crate::error::{Error, Result};
use crate::functional::Buf;
use crate::reader;
use crate::schema::{self, TrackKind};
use crate::source::{self, Source};
use crate::tree::{Handle, Tree, Value};
use crate::vint;

/// 1 millisecond, in nanoseconds: the tolerance `build_from_cues` allows
/// a Cue's time to drift off the track's constant-duration frame grid
/// before concluding the file isn't truly CFR.
const CFR_DRIFT_TOLERANCE_NS: u128 = 1_000_000;

/// Which source the index was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    /// Built from `Segment/Cues`: sparse, keyframe-only, cheap.
    Cfr,
    /// Built by scanning every Cluster's blocks: exhaustive, expensive.
    Vfr,
}

/// One indexed frame.
#[derive(Debug, Clone, Copy)]
pub struct IndexEntry {
    /// The track this frame belongs to.
    pub track_number: u64,
    /// Presentation time in nanoseconds.
    pub timecode_ns: u128,
    /// Absolute offset of the Cluster containing this frame.
    pub cluster_offset: u64,
    /// Whether this is a random-access point.
    pub keyframe: bool,
    /// 0-based position of this frame within its track's decode order.
    pub frame_index: u64,
}

/// A run of consecutive frames on one track sharing the same (snapped)
/// frame rate.
#[derive(Debug, Clone, Copy)]
pub struct FpsSpan {
    /// The track this span describes.
    pub track_number: u64,
    /// First frame index covered by this span.
    pub start_frame: u64,
    /// Presentation time of `start_frame`, in nanoseconds.
    pub start_time: u128,
    /// The snapped frame rate, in frames per second.
    pub fps: f64,
}

/// The built index: entries in timecode order per track, plus derived
/// same-FPS spans and the arrays callers most often want directly.
#[derive(Debug, Clone)]
pub struct FrameIndex {
    /// How this index was built.
    pub mode: IndexMode,
    /// Indexed frames, not necessarily sorted across tracks.
    pub entries: Vec<IndexEntry>,
    /// Derived constant-rate spans.
    pub spans: Vec<FpsSpan>,
    /// Frame indices of keyframes on the indexed video track, sorted and
    /// deduplicated.
    pub keyframes: Vec<u64>,
    /// Presentation timecodes across the indexed entries, sorted and
    /// deduplicated.
    pub timecodes: Vec<u128>,
}

/// Builds a frame index for `segment`. Uses Cues if materialized and
/// non-empty (CFR), otherwise scans Cluster bytes directly (VFR).
/// `track_filter`, if set, restricts indexing to one track number.
pub fn build(source: &mut impl Source, tree: &Tree, segment: Handle, track_filter: Option<u64>) -> Result<FrameIndex> {
    let scale = cook::timecode_scale(tree, segment);

    if let Some(cues) = tree.get(segment).children.get("Cues") {
        let entries = build_from_cues(tree, segment, cues, scale, track_filter);
        if !entries.is_empty() {
            return Ok(finish(IndexMode::Cfr, entries, tree, segment, track_filter));
        }
    }

    let entries = build_from_clusters(source, tree, segment, scale, track_filter)?;
    Ok(finish(IndexMode::Vfr, entries, tree, segment, track_filter))
}

fn finish(mode: IndexMode, entries: Vec<IndexEntry>, tree: &Tree, segment: Handle, track_filter: Option<u64>) -> FrameIndex {
    let spans = derive_spans(&entries);
    let keyframe_track = track_filter.or_else(|| video_track_number(tree, segment));
    let keyframes = {
        let mut v: Vec<u64> = entries
            .iter()
            .filter(|e| e.keyframe && keyframe_track.is_some_and(|t| t == e.track_number))
            .map(|e| e.frame_index)
            .collect();
        v.sort_unstable();
        v.dedup();
        v
    };
    let timecodes = {
        let mut v: Vec<u128> = entries.iter().map(|e| e.timecode_ns).collect();
        v.sort_unstable();
        v.dedup();
        v
    };
    FrameIndex { mode, entries, spans, keyframes, timecodes }
}

/// Finds the video track's number, preferring the `TrackKind` bucket
/// populated during cooking; falls back to a direct scan of `TrackEntry`
/// children in case `Tracks` was never materialized through the normal
/// walk (e.g. a caller built a tree without wanting `Segment/Tracks`).
fn video_track_number(tree: &Tree, segment: Handle) -> Option<u64> {
    let tracks = tree.get(segment).children.get("Tracks")?;
    if let Some(handles) = tree.get(tracks).track_kinds.get(&TrackKind::Video) {
        if let Some(&entry) = handles.first() {
            return track_number_of(tree, entry);
        }
    }
    tree.get(tracks).children.get_all("TrackEntry").iter().find_map(|&entry| {
        let kind_h = tree.get(entry).children.get("TrackType")?;
        match tree.get(kind_h).value {
            Value::Uint(1) => track_number_of(tree, entry),
            _ => None,
        }
    })
}

fn track_number_of(tree: &Tree, track_entry: Handle) -> Option<u64> {
    let num_h = tree.get(track_entry).children.get("TrackNumber")?;
    match tree.get(num_h).value {
        Value::Uint(n) => Some(n),
        _ => None,
    }
}

/// The video track's `DefaultDuration`, in nanoseconds per frame
/// (already rescaled by cooking).
fn default_duration_ns(tree: &Tree, segment: Handle, video_track: u64) -> Option<u64> {
    let tracks = tree.get(segment).children.get("Tracks")?;
    let entry = tree.get(tracks).children.get_all("TrackEntry").iter().copied().find(|&e| track_number_of(tree, e) == Some(video_track))?;
    let dur_h = tree.get(entry).children.get("DefaultDuration")?;
    match tree.get(dur_h).value {
        Value::Uint(ns) => Some(ns),
        _ => None,
    }
}

/// Builds a CFR index from `Segment/Cues`: every Cue on the video track
/// is expected to fall exactly on a multiple of that track's
/// `DefaultDuration`. A Cue that drifts more than
/// [`CFR_DRIFT_TOLERANCE_NS`] off that grid means the file isn't truly
/// constant-rate; this aborts the whole CFR attempt (returns an empty
/// `Vec`), which `build` interprets as "fall back to the Cluster scan."
fn build_from_cues(tree: &Tree, segment: Handle, cues: Handle, scale: u64, track_filter: Option<u64>) -> Vec<IndexEntry> {
    let Some(video_track) = track_filter.or_else(|| video_track_number(tree, segment)) else {
        log::warn!("no video track found; skipping CFR indexing");
        return Vec::new();
    };
    let Some(frame_duration_ns) = default_duration_ns(tree, segment, video_track) else {
        log::warn!("video track {video_track} has no DefaultDuration; skipping CFR indexing");
        return Vec::new();
    };
    if frame_duration_ns == 0 {
        log::warn!("video track {video_track} has a zero DefaultDuration; skipping CFR indexing");
        return Vec::new();
    }

    let segment_payload = tree.get(segment).payload_offset();
    let mut out = Vec::new();

    for cue_point in tree.get(cues).children.get_all("CuePoint") {
        let cp = tree.get(*cue_point);
        let Some(time_h) = cp.children.get("CueTime") else { continue };
        let Value::Uint(cue_time) = tree.get(time_h).value else { continue };

        for pos_h in cp.children.get_all("CueTrackPositions") {
            let positions = tree.get(*pos_h);
            let Some(track_h) = positions.children.get("CueTrack") else { continue };
            let Value::Uint(track_number) = tree.get(track_h).value else { continue };
            if track_number != video_track {
                continue;
            }
            let Some(cluster_h) = positions.children.get("CueClusterPosition") else { continue };
            let Value::Uint(cluster_rel) = tree.get(cluster_h).value else { continue };

            let cue_time_ns = cook::scale_to_ns(cue_time, scale);
            let frame_duration = frame_duration_ns as u128;
            let frame = cue_time_ns / frame_duration;
            let remainder = cue_time_ns % frame_duration;
            let off_grid = remainder.min(frame_duration - remainder);
            if off_grid > CFR_DRIFT_TOLERANCE_NS {
                log::warn!("cue at {cue_time_ns}ns on track {video_track} is {off_grid}ns off the constant-rate grid; aborting CFR indexing");
                return Vec::new();
            }

            out.push(IndexEntry {
                track_number,
                timecode_ns: cue_time_ns,
                cluster_offset: segment_payload + cluster_rel,
                keyframe: true,
                frame_index: frame as u64,
            });
        }
    }
    out
}

fn build_from_clusters(source: &mut impl Source, tree: &Tree, segment: Handle, scale: u64, track_filter: Option<u64>) -> Result<Vec<IndexEntry>> {
    let mut out = Vec::new();
    let mut frame_counters: HashMap<u64, u64> = HashMap::new();
    for cluster_h in tree.get(segment).children.get_all("Cluster") {
        let cluster = tree.get(*cluster_h);
        let end = cluster_end_offset(source, cluster.offset, cluster.header_len, cluster.size)?;
        let payload_offset = cluster.payload_offset();
        source::seek_to(source, payload_offset)?;
        let bytes = source::read_vec(source, (end - payload_offset) as usize)?;
        scan_cluster_bytes(&bytes, cluster.offset, scale, track_filter, &mut frame_counters, &mut out)?;
    }
    Ok(out)
}

/// Resolves a Cluster's end offset, recomputing it for an unknown-size
/// Cluster the main traversal didn't keep the resolved bound for.
fn cluster_end_offset(source: &mut impl Source, offset: u64, header_len: u32, size: Option<u64>) -> Result<u64> {
    let payload_offset = offset + u64::from(header_len);
    if let Some(size) = size {
        return Ok(payload_offset + size);
    }
    source::seek_to(source, payload_offset)?;
    loop {
        let pos = source::position(source)?;
        let Ok(header) = reader::read_header(source, "Segment/Cluster") else {
            return Ok(pos);
        };
        if schema::resolve("Segment/Cluster", header.id.0).is_none() {
            source::seek_to(source, pos)?;
            return Ok(pos);
        }
        match header.end_offset() {
            Some(e) => source::seek_to(source, e)?,
            None => return Ok(pos),
        }
    }
}

fn scan_cluster_bytes(
    bytes: &[u8],
    cluster_offset: u64,
    scale: u64,
    track_filter: Option<u64>,
    frame_counters: &mut HashMap<u64, u64>,
    out: &mut Vec<IndexEntry>,
) -> Result<()> {
    let mut cluster_timecode: u64 = 0;
    let mut buf: &[u8] = bytes;
    while buf.has_remaining() {
        let (id, _) = vint::read_identifier(&mut buf)?;
        let size = vint::read_size(&mut buf)?.ok_or_else(|| Error::structure(cluster_offset, "unknown-size element inside Cluster"))? as usize;
        if size > buf.remaining() {
            return Err(Error::OutOfBounds);
        }
        let payload = buf.slice(size);
        match id.0 {
            0xE7 => cluster_timecode = vint::decode_uint(payload)?, // Timecode
            0xA3 => {
                // SimpleBlock: keyframe status is its own flag bit.
                if let Some(entry) = parse_block(payload, cluster_timecode, scale, track_filter, true, cluster_offset, frame_counters)? {
                    out.push(entry);
                }
            }
            0xA0 => {
                // BlockGroup: keyframe status is the absence of ReferenceBlock.
                if let Some(entry) = parse_block_group(payload, cluster_timecode, scale, track_filter, cluster_offset, frame_counters)? {
                    out.push(entry);
                }
            }
            _ => {}
        }
        buf.advance(size);
    }
    Ok(())
}

fn next_frame_index(frame_counters: &mut HashMap<u64, u64>, track_number: u64) -> u64 {
    let counter = frame_counters.entry(track_number).or_insert(0);
    let index = *counter;
    *counter += 1;
    index
}

fn parse_block(
    payload: &[u8],
    cluster_timecode: u64,
    scale: u64,
    track_filter: Option<u64>,
    use_flag_bit: bool,
    cluster_offset: u64,
    frame_counters: &mut HashMap<u64, u64>,
) -> Result<Option<IndexEntry>> {
    let mut cursor: &[u8] = payload;
    let track_number = vint::read_size(&mut cursor)?.ok_or_else(|| Error::structure(cluster_offset, "block track number has unknown-size encoding"))?;
    // Every block on every track advances that track's frame counter,
    // regardless of whether this track is the one being indexed.
    let frame_index = next_frame_index(frame_counters, track_number);
    if track_filter.is_some_and(|wanted| wanted != track_number) {
        return Ok(None);
    }
    if cursor.remaining() < 3 {
        return Err(Error::OutOfBounds);
    }
    let rel_bytes = cursor.slice(2);
    let rel = i16::from_be_bytes([rel_bytes[0], rel_bytes[1]]);
    cursor.advance(2);
    let flags = cursor.slice(1)[0];
    let keyframe = use_flag_bit && (flags & 0x80 != 0);
    let timecode = (i64::try_from(cluster_timecode).unwrap_or(i64::MAX) + i64::from(rel)).max(0) as u64;

    Ok(Some(IndexEntry {
        track_number,
        timecode_ns: cook::scale_to_ns(timecode, scale),
        cluster_offset,
        keyframe,
        frame_index,
    }))
}

fn parse_block_group(
    payload: &[u8],
    cluster_timecode: u64,
    scale: u64,
    track_filter: Option<u64>,
    cluster_offset: u64,
    frame_counters: &mut HashMap<u64, u64>,
) -> Result<Option<IndexEntry>> {
    let mut buf: &[u8] = payload;
    let mut block_entry = None;
    let mut has_reference = false;

    while buf.has_remaining() {
        let (id, _) = vint::read_identifier(&mut buf)?;
        let size = vint::read_size(&mut buf)?.ok_or_else(|| Error::structure(cluster_offset, "unknown-size element inside BlockGroup"))? as usize;
        if size > buf.remaining() {
            return Err(Error::OutOfBounds);
        }
        let slice = buf.slice(size);
        match id.0 {
            0xA1 => block_entry = parse_block(slice, cluster_timecode, scale, track_filter, false, cluster_offset, frame_counters)?,
            0xFB => has_reference = true, // ReferenceBlock
            _ => {}
        }
        buf.advance(size);
    }

    Ok(block_entry.map(|mut e| {
        e.keyframe = !has_reference;
        e
    }))
}

/// Groups entries by track, then merges consecutive frames whose
/// inter-frame gap snaps to the same frame rate into a single span.
fn derive_spans(entries: &[IndexEntry]) -> Vec<FpsSpan> {
    let mut by_track: HashMap<u64, Vec<&IndexEntry>> = HashMap::new();
    for e in entries {
        by_track.entry(e.track_number).or_default().push(e);
    }

    let mut spans = Vec::new();
    for (track, mut frames) in by_track {
        frames.sort_by_key(|e| e.frame_index);
        let mut i = 0;
        while i + 1 < frames.len() {
            let delta = frames[i + 1].timecode_ns.saturating_sub(frames[i].timecode_ns);
            if delta == 0 {
                i += 1;
                continue;
            }
            let fps = cook::snap_fps(1_000_000_000.0 / delta as f64);
            let start_frame = frames[i].frame_index;
            let start_time = frames[i].timecode_ns;
            let mut j = i + 1;
            while j + 1 < frames.len() {
                let next_delta = frames[j + 1].timecode_ns.saturating_sub(frames[j].timecode_ns);
                if next_delta == 0 {
                    break;
                }
                let next_fps = cook::snap_fps(1_000_000_000.0 / next_delta as f64);
                if (next_fps - fps).abs() > 0.001 {
                    break;
                }
                j += 1;
            }
            spans.push(FpsSpan { track_number: track, start_frame, start_time, fps });
            i = j;
        }
    }
    spans.sort_by(|a, b| (a.track_number, a.start_frame).cmp(&(b.track_number, b.start_frame)));
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(track: u64, frame_index: u64, ms: u128, keyframe: bool) -> IndexEntry {
        IndexEntry { track_number: track, timecode_ns: ms * 1_000_000, cluster_offset: 0, keyframe, frame_index }
    }

    #[test]
    fn derives_single_span_for_constant_rate() {
        // 25fps: 40ms between frames.
        let frames = vec![entry(1, 0, 0, true), entry(1, 1, 40, false), entry(1, 2, 80, false), entry(1, 3, 120, false)];
        let spans = derive_spans(&frames);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].track_number, 1);
        assert!((spans[0].fps - 25.0).abs() < 0.001);
        assert_eq!(spans[0].start_frame, 0);
        assert_eq!(spans[0].start_time, 0);
    }

    #[test]
    fn splits_span_on_rate_change() {
        let mut frames = vec![entry(1, 0, 0, true), entry(1, 1, 40, false), entry(1, 2, 80, false)];
        // Switch to 50fps (20ms) for the rest.
        frames.push(entry(1, 3, 100, false));
        frames.push(entry(1, 4, 120, false));
        let spans = derive_spans(&frames);
        assert_eq!(spans.len(), 2);
        assert!((spans[0].fps - 25.0).abs() < 0.001);
        assert_eq!(spans[0].start_frame, 0);
        assert!((spans[1].fps - 50.0).abs() < 0.001);
        assert_eq!(spans[1].start_frame, 2);
    }

    #[test]
    fn block_group_without_reference_block_is_keyframe() {
        // Block(track=1, rel=0, flags=0) with no ReferenceBlock sibling.
        let block_payload = [0x81, 0x00, 0x00, 0x00];
        let mut block_group = vec![0xA1, 0x80 | block_payload.len() as u8];
        block_group.extend_from_slice(&block_payload);
        let mut frame_counters = HashMap::new();
        let entry = parse_block_group(&block_group, 0, 1_000_000, None, 0, &mut frame_counters).unwrap().unwrap();
        assert!(entry.keyframe);
        assert_eq!(entry.track_number, 1);
        assert_eq!(entry.frame_index, 0);
    }
}
