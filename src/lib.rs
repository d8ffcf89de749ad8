#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

//! A selective Matroska/WebM (EBML) container parser and navigator.
//!
//! [`parse`] walks a byte source and returns a [`Tree`]: only the
//! sections named in [`ParseOptions::wanted`] (plus the cheap, always-
//! useful `Info` and `SeekHead`) are fully decoded. Everything else is
//! header-parsed — its offset, size, and schema identity are known —
//! but its payload is never read, so pulling the track list out of a
//! multi-gigabyte recording costs roughly one seek per top-level
//! element, not a read of the whole file.
//!
//! ```no_run
//! use std::fs::File;
//! use mkv_nav::{parse, ParseOptions};
//!
//! let mut file = File::open("example.mkv")?;
//! let tree = parse(&mut file, &ParseOptions::default().want("Segment/Tracks"))?;
//! # Ok::<(), mkv_nav::Error>(())
//! ```
//!
//! Errors are a closed [`thiserror`] enum ([`Error`]); structural
//! oddities that don't prevent parsing (an identifier unknown to the
//! DTD, a date element of the wrong width) are logged through the
//! [`log`] crate rather than failing the parse.

mod cook;
mod error;
mod functional;
mod index;
mod options;
mod query;
mod reader;
mod schema;
mod source;
mod traversal;
mod tree;
mod vint;

pub use cook::{cluster_time_ns, scale_to_ns, snap_fps, timecode_scale, DEFAULT_TIMECODE_SCALE};
pub use error::{Error, Result};
pub use index::{FpsSpan, FrameIndex, IndexEntry, IndexMode};
pub use options::{GetToken, NullObserver, Observer, ParseOptions, Reply, DEFAULT_CHUNK_SIZE};
pub use query::{closest, find};
pub use schema::{entry_by_path, track_kind, ElementKind, SchemaEntry, TrackKind};
pub use source::{BufferedSource, Source};
pub use tree::{ContainerMap, Element, Handle, Tree, Value};
pub use vint::Id;

/// Parses `source`, returning the structural tree described by
/// `options`.
pub fn parse(source: &mut impl Source, options: &ParseOptions) -> Result<Tree> {
    let mut observer = NullObserver;
    traversal::parse(source, options, &mut observer)
}

/// As [`parse`], but calls `observer` for every element attached to the
/// tree, letting it skip a subtree or abort the parse early.
pub fn parse_with_observer(source: &mut impl Source, options: &ParseOptions, observer: &mut impl Observer) -> Result<Tree> {
    traversal::parse(source, options, observer)
}

/// Builds a frame index over one Segment's tracks: from `Segment/Cues`
/// if materialized and non-empty, otherwise by scanning every
/// Cluster's blocks directly. `track_filter` restricts the index to a
/// single track number.
pub fn build_index(source: &mut impl Source, tree: &Tree, segment: Handle, track_filter: Option<u64>) -> Result<FrameIndex> {
    index::build(source, tree, segment, track_filter)
}

/// Commonly-imported names for downstream crates.
pub mod prelude {
    pub use crate::{
        build_index, parse, parse_with_observer, Element, Error, FrameIndex, GetToken, Handle, Observer, ParseOptions, Reply, Source, Tree,
        Value,
    };
}
