//! Caller-facing knobs for a parse: which sections to descend into, and
//! the observer callback that can redirect or abort the walk mid-parse.

use crate::tree::{Handle, Tree};

/// A section of the tree the caller wants fully materialized, named by
/// its schema path (e.g. `"Segment/Tracks"`, `"Segment/Cues"`).
///
/// Paths outside this list are still walked structurally (their headers
/// are read so sibling offsets are known) but their payloads are never
/// materialized — see the traversal engine's descent policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetToken(pub &'static str);

/// The observer's reply to an element, controlling how the traversal
/// continues past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Keep walking normally.
    Continue,
    /// Don't descend into this element's children (if any); move to its
    /// next sibling.
    Skip,
    /// Stop the parse immediately; the call returns
    /// [`crate::error::Error::Aborted`] and the partial tree is dropped.
    Abort,
}

/// Receives a callback for every element the traversal engine visits,
/// once its header (and payload, if requested) has been attached to the
/// tree.
pub trait Observer {
    /// Called after `handle` has been inserted into `tree`.
    fn on_element(&mut self, tree: &Tree, handle: Handle) -> Reply;
}

/// An observer that never intervenes; the default when the caller only
/// wants the tree itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn on_element(&mut self, _tree: &Tree, _handle: Handle) -> Reply {
        Reply::Continue
    }
}

/// The default window the root search and tail scan read in one chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// The default cap on a single binary leaf's materialized length, in
/// bytes. `SeekID` is exempt (it's load-bearing for jump resolution and
/// never large); `-1` means unlimited.
pub const DEFAULT_BINARY_SIZE_LIMIT: i64 = 16;

/// Options governing a single parse.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Sections to fully materialize; see [`GetToken`].
    pub wanted: Vec<GetToken>,
    /// Whether to additionally build a frame index.
    pub build_index: bool,
    /// Chunk size for the root search and SeekHead-less tail scan.
    pub chunk_size: usize,
    /// Caps how many bytes of a binary leaf's payload are materialized
    /// (the rest is skipped, not read). `-1` disables the cap. Doesn't
    /// apply to `SeekID`, which is always read in full.
    pub binary_size_limit: i64,
    /// When a Segment walk reaches an unwanted Cluster before every
    /// wanted section has been satisfied, keep skip-reading Clusters one
    /// at a time instead of deferring to the tail scan. Slower, but
    /// finds sections the tail scan's backward window might miss.
    pub exhaustive_search: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            wanted: Vec::new(),
            build_index: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            binary_size_limit: DEFAULT_BINARY_SIZE_LIMIT,
            exhaustive_search: false,
        }
    }
}

impl ParseOptions {
    /// Requests that `path` be fully materialized.
    pub fn want(mut self, path: &'static str) -> Self {
        self.wanted.push(GetToken(path));
        self
    }

    /// Requests that a frame index be built from Cues/Clusters.
    pub fn with_index(mut self) -> Self {
        self.build_index = true;
        self
    }

    /// Caps materialized binary leaf payloads to `limit` bytes (`-1` for
    /// unlimited).
    pub fn binary_size_limit(mut self, limit: i64) -> Self {
        self.binary_size_limit = limit;
        self
    }

    /// Keeps skip-reading Clusters sequentially past the first unwanted
    /// one instead of deferring remaining wanted sections to the tail
    /// scan.
    pub fn exhaustive_search(mut self) -> Self {
        self.exhaustive_search = true;
        self
    }

    pub(crate) fn wants(&self, path: &str) -> bool {
        self.wanted.iter().any(|t| t.0 == path)
    }
}
