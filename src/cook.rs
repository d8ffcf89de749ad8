//! Value post-processing ("cooking"): rescaling raw tick counts by
//! `Info/TimecodeScale` once it's known, deriving `TrackType` buckets,
//! and snapping a decoded frame rate to the nearest standard value.
//!
//! No corpus file does exactly this; it follows the general
//! decode-then-derive shape used for muxing-adjacent metadata in
//! `supplement.rs`.

use crate::schema::{self, TrackKind};
use crate::tree::{Handle, Tree, Value};

/// Integer frame rates muxers round to before applying NTSC's 1000/1001
/// drift. Checked against both `f` and `f / 1.001`.
const KNOWN_FPS: &[f64] = &[18.0, 24.0, 25.0, 30.0, 48.0, 60.0, 120.0];
const NTSC_DIVISORS: &[f64] = &[1.0, 1.001];
const SNAP_TOLERANCE: f64 = 0.001;

/// The DTD default for `Info/TimecodeScale`: one tick is one millisecond.
pub const DEFAULT_TIMECODE_SCALE: u64 = 1_000_000;

/// Snaps `fps` to the nearest `f / d` for `f` in [`KNOWN_FPS`] and `d` in
/// [`NTSC_DIVISORS`] within [`SNAP_TOLERANCE`]; failing that, snaps to
/// the nearest integer if within tolerance; otherwise returns `fps`
/// unchanged.
pub fn snap_fps(fps: f64) -> f64 {
    let mut best: Option<f64> = None;
    for &f in KNOWN_FPS {
        for &d in NTSC_DIVISORS {
            let candidate = f / d;
            if (fps - candidate).abs() <= SNAP_TOLERANCE {
                best = Some(match best {
                    Some(b) if (b - fps).abs() <= (candidate - fps).abs() => b,
                    _ => candidate,
                });
            }
        }
    }
    if let Some(snapped) = best {
        return snapped;
    }
    let nearest_int = fps.round();
    if (fps - nearest_int).abs() <= SNAP_TOLERANCE {
        return nearest_int;
    }
    fps
}

/// Converts a raw tick count to nanoseconds using the Segment's
/// `TimecodeScale` (nanoseconds per tick).
pub fn scale_to_ns(ticks: u64, timecode_scale: u64) -> u128 {
    u128::from(ticks) * u128::from(timecode_scale)
}

/// Reads `Segment/Info/TimecodeScale`, falling back to the DTD default
/// if Info wasn't materialized or the element carries its default-
/// triggering value of zero.
pub fn timecode_scale(tree: &Tree, segment: Handle) -> u64 {
    let Some(info) = tree.get(segment).children.get("Info") else {
        return DEFAULT_TIMECODE_SCALE;
    };
    let Some(scale_handle) = tree.get(info).children.get("TimecodeScale") else {
        return DEFAULT_TIMECODE_SCALE;
    };
    match tree.get(scale_handle).value {
        Value::Uint(v) if v != 0 => v,
        _ => DEFAULT_TIMECODE_SCALE,
    }
}

/// Retroactively rescales a Cluster's raw `Timecode` tick value to
/// nanoseconds, once `Info/TimecodeScale` is known. Clusters are read
/// (and their `Timecode` decoded) before the whole Segment has
/// necessarily been seen, so this conversion happens as a second pass
/// rather than inline during the element read.
pub fn cluster_time_ns(tree: &Tree, segment: Handle, cluster_timecode: u64) -> u128 {
    scale_to_ns(cluster_timecode, timecode_scale(tree, segment))
}

/// Per-Segment cooking state, threaded through a walk instead of kept as
/// global mutable session state: `Info/TimecodeScale` may appear after
/// elements it governs (`Info/Duration`), so those are queued until the
/// scale is known.
#[derive(Debug, Default)]
pub(crate) struct CookContext {
    timecode_scale: Option<u64>,
    pending_rescale: Vec<Handle>,
}

impl CookContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn scale(&self) -> u64 {
        self.timecode_scale.unwrap_or(DEFAULT_TIMECODE_SCALE)
    }
}

/// Post-processes one just-inserted leaf, given its parent's schema name
/// and its own. Returns the element's [`TrackKind`] when `name` is
/// `TrackEntry/TrackType`, for the caller to bucket under `Tracks`.
pub(crate) fn cook_leaf(tree: &mut Tree, ctx: &mut CookContext, handle: Handle, parent_name: &str, name: &str) -> Option<TrackKind> {
    match (parent_name, name) {
        ("Info", "TimecodeScale") => {
            if let Value::Uint(v) = tree.get(handle).value {
                if v != 0 {
                    ctx.timecode_scale = Some(v);
                }
            }
            let scale = ctx.scale();
            for pending in std::mem::take(&mut ctx.pending_rescale) {
                rescale_duration(tree, pending, scale);
            }
            None
        }
        ("Info", "Duration") => {
            match ctx.timecode_scale {
                Some(scale) => rescale_duration(tree, handle, scale),
                None => ctx.pending_rescale.push(handle),
            }
            None
        }
        ("Cluster", "Timecode") | ("CuePoint", "CueTime") | ("CueTrackPositions", "CueDuration") | ("BlockGroup", "BlockDuration") => {
            rescale_uint_to_ns(tree, handle, ctx.scale());
            None
        }
        // ChapterAtom timestamps are defined in nanoseconds directly; no rescale.
        ("ChapterAtom", "ChapterTimeStart") | ("ChapterAtom", "ChapterTimeEnd") => None,
        // Consumed directly (already raw ticks-per-frame) by the frame indexer.
        ("TrackEntry", "DefaultDuration") | ("TrackEntry", "DefaultDecodedFieldDuration") => None,
        ("TrackEntry", "TrackType") => match tree.get(handle).value {
            Value::Uint(raw) => schema::track_kind(raw),
            _ => None,
        },
        _ => None,
    }
}

fn rescale_duration(tree: &mut Tree, handle: Handle, scale: u64) {
    if let Value::Float(ticks) = tree.get(handle).value {
        tree.get_mut(handle).value = Value::Float(ticks * scale as f64);
    }
}

fn rescale_uint_to_ns(tree: &mut Tree, handle: Handle, scale: u64) {
    if let Value::Uint(ticks) = tree.get(handle).value {
        let ns = scale_to_ns(ticks, scale).min(u64::MAX as u128) as u64;
        tree.get_mut(handle).value = Value::Uint(ns);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snaps_ntsc_rates() {
        assert!((snap_fps(23.976) - 24.0 / 1.001).abs() < 1e-9);
        assert!((snap_fps(29.97) - 30.0 / 1.001).abs() < 1e-9);
        assert_eq!(snap_fps(30.0), 30.0);
    }

    #[test]
    fn snaps_near_integer_when_no_table_match() {
        assert_eq!(snap_fps(100.0004), 100.0);
    }

    #[test]
    fn leaves_unrelated_rates_untouched() {
        assert_eq!(snap_fps(12.5), 12.5);
    }

    #[test]
    fn default_scale_is_one_million() {
        assert_eq!(scale_to_ns(40, DEFAULT_TIMECODE_SCALE), 40_000_000);
    }
}
