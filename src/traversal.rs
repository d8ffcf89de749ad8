//! The selective traversal engine: finds the EBML header and Segment
//! roots, walks only the sections the caller asked for, follows
//! SeekHead to jump straight to a wanted section when possible, and
//! falls back to a tail scan for a section a broken or minimal
//! SeekHead doesn't mention.
//!
//! The read-one-child-at-a-time shape follows `master.rs`'s dispatch
//! loop; the jump/tail-scan/unknown-size machinery has no counterpart
//! there and is built from the corpus's general VINT bit-manipulation
//! idiom instead.

use std::collections::{HashMap, HashSet};

use crate::cook::{self, CookContext};
use crate::error::{Error, Result};
use crate::index;
use crate::options::{Observer, ParseOptions, Reply};
use crate::reader::{self, Header};
use crate::schema;
use crate::source::{self, Source};
use crate::tree::{Element, Handle, Tree, Value};
use crate::vint::{self, Id};

const EBML_ID: u64 = 0x1A45_DFA3;
const SEGMENT_ID: u64 = 0x1853_8067;

/// Level-1 (direct Segment child) container identifiers the tail scan
/// searches for when validating a candidate: a validated candidate's
/// computed end must line up with the previously accepted candidate's
/// start (or the file's end, for the first one), and only a Level-1 id
/// can plausibly start right where another one ends.
const LEVEL1_IDS: [u64; 8] = [
    0x1254_C367, // Tags
    0x114D_9B74, // SeekHead
    0x1F43_B675, // Cluster
    0x1C53_BB6B, // Cues
    0x1043_A770, // Chapters
    0x1941_A469, // Attachments
    0x1654_AE6B, // Tracks
    0x1549_A966, // Info
];

/// Runs a full parse: locates the roots, then walks Segment according
/// to `options`, calling `observer` for every element attached to the
/// tree.
pub fn parse(source: &mut impl Source, options: &ParseOptions, observer: &mut impl Observer) -> Result<Tree> {
    let mut tree = Tree::new();
    let total_len = source::len(source)?;

    let mut satisfied: HashMap<&'static str, bool> = options.wanted.iter().map(|t| (t.0, false)).collect();
    let mut visited: HashSet<u64> = HashSet::new();

    let mut found_segment: Option<Handle> = None;
    let mut segment_cook_ctx = CookContext::new();
    let mut pos = 0u64;
    let mut first_attempt = true;
    while pos < total_len {
        source::seek_to(source, pos)?;
        let header = match reader::read_header(source, "") {
            Ok(h) => h,
            Err(_) if first_attempt => {
                match locate_root_via_scan(source, total_len, options.chunk_size)? {
                    Some(offset) => {
                        pos = offset;
                        first_attempt = false;
                        continue;
                    }
                    None => return Err(Error::MissingRoot),
                }
            }
            Err(_) => break,
        };
        first_attempt = false;

        match header.id.0 {
            EBML_ID => {
                let handle = insert_header(&mut tree, &header, None);
                visited.insert(header.offset);
                if header.is_container() {
                    let mut ebml_ctx = CookContext::new();
                    walk_container(source, &mut tree, handle, "Ebml", header.end_offset(), options, observer, &mut satisfied, &mut visited, &mut ebml_ctx)?;
                }
            }
            SEGMENT_ID => {
                let handle = insert_header(&mut tree, &header, None);
                visited.insert(header.offset);
                let mut cook_ctx = CookContext::new();
                walk_container(source, &mut tree, handle, "Segment", header.end_offset(), options, observer, &mut satisfied, &mut visited, &mut cook_ctx)?;
                found_segment = Some(handle);
                segment_cook_ctx = cook_ctx;
            }
            _ => {
                log::warn!("unexpected top-level element {} at offset {}", header.id, header.offset);
            }
        }

        pos = match header.end_offset() {
            Some(end) => end,
            None => source::position(source)?,
        };
    }

    let Some(segment_handle) = found_segment else {
        return Err(Error::MissingRoot);
    };

    // A section a SeekHead jump didn't reach and the sequential walk
    // never got to (truncated SeekHead, or an unknown-size element
    // further up that ran off the end of the file): try a tail scan.
    for token in &options.wanted {
        if *satisfied.get(token.0).unwrap_or(&false) {
            continue;
        }
        let Some((parent, name)) = token.0.rsplit_once('/') else { continue };
        let Some(entry) = schema::entry_by_path(token.0) else { continue };
        if let Some(offset) = locate_last_container(source, total_len, entry.id, options.chunk_size)? {
            if visited.contains(&offset) {
                continue;
            }
            source::seek_to(source, offset)?;
            if let Ok(candidate) = reader::read_header(source, parent) {
                if candidate.offset == offset && candidate.name() == name {
                    let h = insert_header(&mut tree, &candidate, Some(segment_handle));
                    visited.insert(candidate.offset);
                    if candidate.is_container() {
                        walk_container(source, &mut tree, h, token.0, candidate.end_offset(), options, observer, &mut satisfied, &mut visited, &mut segment_cook_ctx)?;
                    } else {
                        tree.get_mut(h).value = reader::read_leaf_value(source, &candidate, options)?;
                        let parent_name = parent.rsplit('/').next().unwrap_or(parent);
                        cook::cook_leaf(&mut tree, &mut segment_cook_ctx, h, parent_name, candidate.name());
                    }
                    satisfied.insert(token.0, true);
                }
            }
        }
    }

    if options.build_index {
        let idx = index::build(source, &tree, segment_handle, None)?;
        tree.frame_index = Some(idx);
    }

    Ok(tree)
}

fn insert_header(tree: &mut Tree, header: &Header, parent: Option<Handle>) -> Handle {
    if let Some(p) = parent {
        warn_if_duplicate(tree, p, header);
    }
    let value = if header.is_container() { Value::Container } else { Value::Skipped };
    tree.insert(
        Element {
            id: header.id,
            name: header.name(),
            schema: header.schema,
            offset: header.offset,
            header_len: header.header_len,
            size: header.size,
            value,
            children: Default::default(),
            parent: None,
            track_kinds: Default::default(),
        },
        parent,
    )
}

/// Logs when a second occurrence of a non-multiple element is about to
/// be attached under `parent`. `ContainerMap` already supports repeated
/// names structurally (`get_all`); this only surfaces the DTD violation
/// as a diagnostic rather than rejecting the insert.
fn warn_if_duplicate(tree: &Tree, parent: Handle, header: &Header) {
    let Some(schema) = header.schema else { return };
    if schema.multiple {
        return;
    }
    if !tree.get(parent).children.get_all(header.name()).is_empty() {
        log::warn!(
            "second occurrence of non-multiple element {} under {} at offset {}",
            header.name(),
            tree.path(parent),
            header.offset
        );
    }
}

/// Whether `a` and `b` are the same path, or one is an ancestor of the
/// other, so walking between them (in either direction) is necessary.
fn path_related(a: &str, b: &str) -> bool {
    a == b || b.starts_with(&format!("{a}/")) || a.starts_with(&format!("{b}/"))
}

/// Whether `path` falls inside `Segment/Info` or `Segment/SeekHead`: the
/// two sections that are always fully materialized regardless of what
/// the caller asked for, since both are small and SeekHead's contents
/// are needed to plan jumps before any wanted section is read.
fn is_always_subtree(path: &str) -> bool {
    const ROOTS: [&str; 2] = ["Segment/Info", "Segment/SeekHead"];
    ROOTS.iter().any(|root| path == *root || path.starts_with(&format!("{root}/")))
}

/// Reads every direct child of the container at `handle` (path `path`,
/// payload ending at `end`, or running to the next element that isn't a
/// valid child if `end` is `None`), descending into sections the
/// traversal policy selects and skipping the rest.
#[allow(clippy::too_many_arguments)]
fn walk_container(
    source: &mut impl Source,
    tree: &mut Tree,
    handle: Handle,
    path: &str,
    end: Option<u64>,
    options: &ParseOptions,
    observer: &mut impl Observer,
    satisfied: &mut HashMap<&'static str, bool>,
    visited: &mut HashSet<u64>,
    cook_ctx: &mut CookContext,
) -> Result<()> {
    let payload_start = tree.get(handle).payload_offset();
    source::seek_to(source, payload_start)?;
    let parent_name = path.rsplit('/').next().unwrap_or(path);

    loop {
        let pos = source::position(source)?;
        if let Some(end) = end {
            if pos >= end {
                break;
            }
        }
        if visited.contains(&pos) {
            let Ok(probe) = reader::read_header(source, path) else { break };
            let target = skip_target(source, &probe, path)?;
            source::seek_to(source, target)?;
            continue;
        }

        let header = match reader::read_header(source, path) {
            Ok(h) => h,
            Err(_) if end.is_none() => break,
            Err(e) => return Err(e),
        };
        if schema::resolve(path, header.id.0).is_none() {
            // Not a valid member of this container: this is the
            // terminator for an unknown-size element.
            source::seek_to(source, pos)?;
            break;
        }

        let child_path = format!("{path}/{}", header.name());
        let is_cluster = header.name() == "Cluster";
        let matched_wanted = options.wanted.iter().any(|t| path_related(t.0, &child_path));
        let always = is_always_subtree(&child_path);
        let should_process = if is_cluster { matched_wanted } else { always || matched_wanted };

        if is_cluster && !matched_wanted && !options.exhaustive_search {
            let any_unsatisfied = satisfied.values().any(|done| !*done);
            if any_unsatisfied {
                // Leave the remaining wanted sections to the tail scan
                // rather than skip-reading every Cluster header in
                // between one at a time.
                source::seek_to(source, pos)?;
                break;
            }
        }

        let reply = if should_process && header.is_container() {
            let h = insert_header(tree, &header, Some(handle));
            visited.insert(header.offset);
            let reply = observer.on_element(tree, h);
            if reply == Reply::Continue {
                walk_container(source, tree, h, &child_path, header.end_offset(), options, observer, satisfied, visited, cook_ctx)?;
                if header.name() == "SeekHead" {
                    let resume = source::position(source)?;
                    try_seek_jumps(source, tree, handle, path, h, options, satisfied, visited, observer, cook_ctx)?;
                    source::seek_to(source, resume)?;
                }
            } else if reply == Reply::Skip {
                let target = skip_target(source, &header, &child_path)?;
                source::seek_to(source, target)?;
            }
            reply
        } else if should_process {
            warn_if_duplicate(tree, handle, &header);
            let value = reader::read_leaf_value(source, &header, options)?;
            let h = tree.insert(
                Element {
                    id: header.id,
                    name: header.name(),
                    schema: header.schema,
                    offset: header.offset,
                    header_len: header.header_len,
                    size: header.size,
                    value,
                    children: Default::default(),
                    parent: None,
                    track_kinds: Default::default(),
                },
                Some(handle),
            );
            visited.insert(header.offset);
            if let Some(kind) = cook::cook_leaf(tree, cook_ctx, h, parent_name, header.name()) {
                if let Some(tracks_handle) = tree.get(handle).parent {
                    tree.get_mut(tracks_handle).track_kinds.entry(kind).or_default().push(handle);
                }
            }
            observer.on_element(tree, h)
        } else {
            let h = insert_header(tree, &header, Some(handle));
            visited.insert(header.offset);
            let target = skip_target(source, &header, &child_path)?;
            source::seek_to(source, target)?;
            observer.on_element(tree, h)
        };

        if reply == Reply::Abort {
            return Err(Error::Aborted);
        }
        if let Some(flag) = satisfied.get_mut(child_path.as_str()) {
            *flag = true;
        }
    }
    Ok(())
}

/// Where to resume reading after an element is skipped: the end of its
/// known size, or the computed terminator of an unknown-size container.
fn skip_target(source: &mut impl Source, header: &Header, path: &str) -> Result<u64> {
    match header.end_offset() {
        Some(end) => Ok(end),
        None => find_unknown_size_end(source, header, path),
    }
}

/// Scans past an unknown-size container by reading its children's
/// headers (recursing into any unknown-size grandchildren) until an
/// identifier is seen that doesn't resolve under `path`, which can only
/// mean the container has ended.
fn find_unknown_size_end(source: &mut impl Source, header: &Header, path: &str) -> Result<u64> {
    source::seek_to(source, header.payload_offset())?;
    loop {
        let pos = source::position(source)?;
        let child = match reader::read_header(source, path) {
            Ok(h) => h,
            Err(_) => return Ok(pos),
        };
        if schema::resolve(path, child.id.0).is_none() {
            source::seek_to(source, pos)?;
            return Ok(pos);
        }
        let child_path = format!("{path}/{}", child.name());
        let next = skip_target(source, &child, &child_path)?;
        source::seek_to(source, next)?;
    }
}

/// After processing a SeekHead, jumps directly to every still-
/// unsatisfied wanted section it references, parses it, and marks it
/// satisfied so the sequential walk skips it when it gets there.
#[allow(clippy::too_many_arguments)]
fn try_seek_jumps(
    source: &mut impl Source,
    tree: &mut Tree,
    segment_handle: Handle,
    segment_path: &str,
    seekhead_handle: Handle,
    options: &ParseOptions,
    satisfied: &mut HashMap<&'static str, bool>,
    visited: &mut HashSet<u64>,
    observer: &mut impl Observer,
    cook_ctx: &mut CookContext,
) -> Result<()> {
    let mut targets = Vec::new();
    collect_seek_targets(tree, seekhead_handle, &mut targets);
    let segment_payload_offset = tree.get(segment_handle).payload_offset();
    let segment_name = segment_path.rsplit('/').next().unwrap_or(segment_path);

    for token in &options.wanted {
        if *satisfied.get(token.0).unwrap_or(&false) {
            continue;
        }
        let Some((parent, name)) = token.0.rsplit_once('/') else { continue };
        if parent != segment_path {
            continue;
        }
        let Some(entry) = schema::entry_by_path(token.0) else { continue };
        let Some((_, seek_pos)) = targets.iter().find(|(id, _)| id.0 == entry.id) else { continue };
        let absolute = segment_payload_offset + seek_pos;
        if visited.contains(&absolute) {
            continue;
        }
        source::seek_to(source, absolute)?;
        let Ok(jump_header) = reader::read_header(source, parent) else { continue };
        if jump_header.offset != absolute || jump_header.name() != name {
            log::warn!("{}", Error::unexpected_identifier(jump_header.offset, jump_header.id));
            continue;
        }
        let h = insert_header(tree, &jump_header, Some(segment_handle));
        visited.insert(jump_header.offset);
        let reply = observer.on_element(tree, h);
        if reply == Reply::Abort {
            return Err(Error::Aborted);
        }
        if reply == Reply::Continue && jump_header.is_container() {
            walk_container(source, tree, h, token.0, jump_header.end_offset(), options, observer, satisfied, visited, cook_ctx)?;
        } else if !jump_header.is_container() {
            tree.get_mut(h).value = reader::read_leaf_value(source, &jump_header, options)?;
            cook::cook_leaf(tree, cook_ctx, h, segment_name, jump_header.name());
        }
        satisfied.insert(token.0, true);
    }
    Ok(())
}

fn collect_seek_targets(tree: &Tree, seekhead: Handle, out: &mut Vec<(Id, u64)>) {
    for seek in tree.get(seekhead).children.get_all("Seek") {
        let seek_el = tree.get(*seek);
        let id_bytes = seek_el.children.get("SeekID").and_then(|h| match &tree.get(h).value {
            Value::Binary(b) => Some(b.clone()),
            _ => None,
        });
        let pos = seek_el.children.get("SeekPosition").and_then(|h| match &tree.get(h).value {
            Value::Uint(v) => Some(*v),
            _ => None,
        });
        if let (Some(bytes), Some(pos)) = (id_bytes, pos) {
            if let Ok(id_value) = vint::decode_uint(&bytes) {
                out.push((Id(id_value), pos));
            }
        }
    }
}

/// The canonical byte encoding of an identifier: its big-endian bytes
/// with leading zero bytes stripped, since EBML IDs are always written
/// in their conventional minimal width.
fn id_pattern(id: u64) -> Vec<u8> {
    let bytes = id.to_be_bytes();
    let first_nonzero = bytes.iter().position(|b| *b != 0).unwrap_or(7);
    bytes[first_nonzero..].to_vec()
}

fn find_pattern(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind_pattern(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).rev().find(|&i| &haystack[i..i + needle.len()] == needle)
}

/// Upper bound on how many chunks the forward root search reads before
/// giving up, so a file with no EBML/Segment identifier anywhere doesn't
/// turn into an unbounded linear scan.
const MAX_ROOT_CHUNKS: usize = 128;

/// Upper bound on how many windows the backward tail scan reads before
/// giving up: 256 windows of the default 64 KiB chunk size covers the
/// last 16 MiB of the file, comfortably more than any Cues/SeekHead
/// placement seen in practice.
const MAX_TAIL_WINDOWS: usize = 256;

/// Chunked forward scan for the EBML header or Segment identifier,
/// used when the stream doesn't start with a valid element (garbage
/// lead-in, or a container format wrapping the Matroska stream).
fn locate_root_via_scan(source: &mut impl Source, total_len: u64, chunk_size: usize) -> Result<Option<u64>> {
    let ebml_pattern = id_pattern(EBML_ID);
    let segment_pattern = id_pattern(SEGMENT_ID);
    let overlap = ebml_pattern.len().max(segment_pattern.len()).saturating_sub(1);

    let mut offset = 0u64;
    let mut chunks_read = 0usize;
    while offset < total_len && chunks_read < MAX_ROOT_CHUNKS {
        let chunk = source::read_chunk(source, offset, chunk_size)?;
        chunks_read += 1;
        if chunk.is_empty() {
            break;
        }
        if let Some(at) = find_pattern(&chunk, &ebml_pattern).or_else(|| find_pattern(&chunk, &segment_pattern)) {
            return Ok(Some(offset + at as u64));
        }
        if chunk.len() < chunk_size {
            break;
        }
        offset += (chunk.len() - overlap) as u64;
    }
    Ok(None)
}

/// Tail-scan heuristic: when a wanted section's location wasn't found
/// via SeekHead or the sequential walk, search backward from the end of
/// the file for a Level-1 identifier whose declared size VINT reaches
/// exactly the previously accepted candidate's start offset (or the
/// file's end, for the first candidate). This rules out false matches
/// on an identifier's byte pattern occurring inside another element's
/// payload, which the byte pattern alone can't distinguish. Used for
/// Cues in particular, since muxers sometimes append it near the end
/// without listing it in SeekHead.
///
/// Returns as soon as a validated candidate matches `target_id`;
/// otherwise keeps walking backward from the newest validated
/// candidate's start, so the caller's next unsatisfied token can resume
/// from there instead of restarting the scan.
fn locate_last_container(source: &mut impl Source, total_len: u64, target_id: u64, chunk_size: usize) -> Result<Option<u64>> {
    // Max Level-1 identifier width, so a candidate straddling two
    // windows' boundary is still found intact in one of them.
    const ID_OVERLAP: u64 = 4;

    let mut last_known_end = total_len;
    let mut end = total_len;
    let mut windows_read = 0usize;

    while end > 0 && windows_read < MAX_TAIL_WINDOWS {
        windows_read += 1;
        let start = end.saturating_sub(chunk_size as u64);
        // Read a few extra trailing bytes so a candidate identifier
        // found right at the window's edge still has its size VINT
        // available to validate.
        let read_len = (end - start) as usize + 8;
        let chunk = source::read_chunk(source, start, read_len)?;

        if let Some((offset, is_target)) = scan_window_for_valid_candidate(&chunk, start, last_known_end, target_id) {
            if is_target {
                return Ok(Some(offset));
            }
            last_known_end = offset;
            end = offset;
            continue;
        }

        if start == 0 {
            return Ok(None);
        }
        end = start + ID_OVERLAP;
    }
    Ok(None)
}

/// Searches `chunk` (read starting at absolute offset `window_start`)
/// backward for the rightmost occurrence of any [`LEVEL1_IDS`] pattern
/// whose declared size validates against `last_known_end`. Returns the
/// candidate's absolute offset and whether it matches `target_id`.
fn scan_window_for_valid_candidate(chunk: &[u8], window_start: u64, last_known_end: u64, target_id: u64) -> Option<(u64, bool)> {
    let mut best: Option<(u64, bool)> = None;
    for &id in &LEVEL1_IDS {
        let pattern = id_pattern(id);
        let mut search_from = chunk.len();
        while let Some(local_offset) = rfind_pattern(&chunk[..search_from], &pattern) {
            search_from = local_offset + pattern.len() - 1;
            let absolute = window_start + local_offset as u64;
            if validate_candidate(chunk, local_offset, pattern.len(), absolute, last_known_end).is_some() {
                let is_target = id == target_id;
                // Prefer the rightmost (latest) validated candidate in
                // this window; among ties, prefer one matching the
                // still-requested section.
                best = match best {
                    Some((prev_offset, prev_is_target)) if prev_offset > absolute || (prev_offset == absolute && prev_is_target) => {
                        Some((prev_offset, prev_is_target))
                    }
                    _ => Some((absolute, is_target)),
                };
                if is_target {
                    return best;
                }
            }
            if search_from == 0 {
                break;
            }
        }
    }
    best
}

/// Parses the size VINT immediately following a candidate identifier
/// and checks that `absolute_offset + id_width + size_width + size`
/// equals `last_known_end`: the contract every Level-1 element upholds
/// with whichever Level-1 element (or the file's end) follows it.
fn validate_candidate(chunk: &[u8], local_offset: usize, id_width: usize, absolute_offset: u64, last_known_end: u64) -> Option<u64> {
    let mut rest = chunk.get(local_offset + id_width..)?;
    let size = vint::read_size(&mut rest).ok()??;
    let size_width = chunk.len().saturating_sub(local_offset + id_width) - rest.len();
    let end = absolute_offset + id_width as u64 + size_width as u64 + size;
    (end == last_known_end).then_some(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_relation_covers_both_directions() {
        assert!(path_related("Segment/Tracks", "Segment/Tracks"));
        assert!(path_related("Segment/Tracks", "Segment/Tracks/TrackEntry"));
        assert!(path_related("Segment/Tracks/TrackEntry/Audio", "Segment/Tracks"));
        assert!(!path_related("Segment/Tracks", "Segment/Cues"));
    }

    #[test]
    fn id_pattern_strips_leading_zero_bytes() {
        assert_eq!(id_pattern(0x1A45_DFA3), vec![0x1A, 0x45, 0xDF, 0xA3]);
        assert_eq!(id_pattern(0xBF), vec![0xBF]);
    }

    #[test]
    fn pattern_search_finds_last_occurrence() {
        let haystack = [0, 0x1C, 0x53, 0xBB, 0x6B, 0, 0x1C, 0x53, 0xBB, 0x6B, 0];
        let needle = [0x1C, 0x53, 0xBB, 0x6B];
        assert_eq!(find_pattern(&haystack, &needle), Some(1));
        assert_eq!(rfind_pattern(&haystack, &needle), Some(6));
    }
}
