//! The parse tree's data model: an arena of elements addressed by
//! integer handles, avoiding parent back-reference cycles, plus the
//! insertion-ordered per-container child index.
//!
//! Grounded in `hasenbanck-matroska-demuxer`'s tagged-union `Element`
//! enum for the `Value` shape; the arena-of-handles layout itself
//! follows a preference for flat, index-addressed collections over
//! boxed trees, generalizing `master.rs`'s `Vec`-backed child lists.

use std::collections::HashMap;

use crate::index::FrameIndex;
use crate::schema::{SchemaEntry, TrackKind};
use crate::vint::Id;

/// A stable reference to a node in a [`Tree`]'s arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Handle(pub(crate) usize);

/// A decoded element payload (`Container`, `Uint`, `Int`, `Float`,
/// `String`, `Date`, `Binary`), plus the `Skipped` sentinel for elements
/// the traversal engine header-parsed but chose not to materialize.
#[derive(Debug, Clone)]
pub enum Value {
    /// Holds other elements; the payload itself carries no scalar data.
    Container,
    /// Unsigned integer (`UInt` in the DTD).
    Uint(u64),
    /// Signed integer.
    Int(i64),
    /// IEEE float, widened to `f64` regardless of source width.
    Float(f64),
    /// UTF-8 text.
    String(String),
    /// Signed nanoseconds since 2001-01-01T00:00:00 UTC.
    Date(i64),
    /// Raw bytes.
    Binary(Vec<u8>),
    /// The element's header was parsed but its body was never read,
    /// because the traversal policy skipped it.
    Skipped,
}

impl Value {
    /// The element kind this value was decoded from, if known.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Container)
    }
}

/// One node in a [`Tree`].
#[derive(Debug, Clone)]
pub struct Element {
    /// The raw EBML identifier (marker bit included).
    pub id: Id,
    /// Schema name, or the hex identifier spelling for unknown elements.
    pub name: &'static str,
    /// The resolved DTD entry, absent for an element unknown to the schema.
    pub schema: Option<&'static SchemaEntry>,
    /// Absolute byte offset of the element's identifier in the source.
    pub offset: u64,
    /// Combined width in bytes of the identifier and size VINTs.
    pub header_len: u32,
    /// Declared payload size. `None` means unknown-size (reads to EOF or
    /// to the next sibling at an equal-or-shallower level).
    pub size: Option<u64>,
    /// The decoded payload, or [`Value::Skipped`].
    pub value: Value,
    /// Children, in document order, indexed by name.
    pub children: ContainerMap,
    /// The parent node, or `None` for a top-level element.
    pub parent: Option<Handle>,
    /// On a `Tracks` container, its `TrackEntry` children bucketed by
    /// decoded `TrackType`. Empty on every other element.
    pub track_kinds: HashMap<TrackKind, Vec<Handle>>,
}

impl Element {
    /// Absolute offset of the first byte after this element's header,
    /// i.e. where its payload begins.
    pub fn payload_offset(&self) -> u64 {
        self.offset + u64::from(self.header_len)
    }

    /// Absolute offset one past the end of the payload, if the size is
    /// known.
    pub fn end_offset(&self) -> Option<u64> {
        self.size.map(|size| self.payload_offset() + size)
    }
}

/// An insertion-ordered, name-keyed index of a container's children.
///
/// A hand-rolled `Vec`-backed map rather than an `indexmap` dependency:
/// container fan-out is small (a handful to a few hundred children), and
/// nothing else in the surrounding crates reaches for an ordered-map
/// crate for lookups at this scale.
#[derive(Debug, Default, Clone)]
pub struct ContainerMap {
    order: Vec<Handle>,
    by_name: HashMap<&'static str, Vec<Handle>>,
}

impl ContainerMap {
    fn insert(&mut self, name: &'static str, handle: Handle) {
        self.order.push(handle);
        self.by_name.entry(name).or_default().push(handle);
    }

    /// The first child with the given name, in document order.
    pub fn get(&self, name: &str) -> Option<Handle> {
        self.by_name.get(name).and_then(|v| v.first().copied())
    }

    /// All children with the given name, in document order.
    pub fn get_all(&self, name: &str) -> &[Handle] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All children, in document order, regardless of name.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Handle> + '_ {
        self.order.iter().copied()
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the container has no children.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// The parse tree: a flat arena of [`Element`]s linked by [`Handle`]s.
#[derive(Debug, Default)]
pub struct Tree {
    arena: Vec<Element>,
    /// Top-level elements (typically the EBML header followed by one or
    /// more Segments), in document order.
    pub top_level: Vec<Handle>,
    /// The frame index, if [`crate::options::ParseOptions::build_index`]
    /// was set for this parse.
    pub frame_index: Option<FrameIndex>,
}

impl Tree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrows the element at `handle`.
    pub fn get(&self, handle: Handle) -> &Element {
        &self.arena[handle.0]
    }

    /// Mutably borrows the element at `handle`.
    pub fn get_mut(&mut self, handle: Handle) -> &mut Element {
        &mut self.arena[handle.0]
    }

    /// Inserts a new node, linking it under `parent` (or as a top-level
    /// node when `parent` is `None`), and returns its handle.
    pub fn insert(&mut self, mut element: Element, parent: Option<Handle>) -> Handle {
        element.parent = parent;
        let name = element.name;
        let handle = Handle(self.arena.len());
        self.arena.push(element);
        match parent {
            Some(p) => self.arena[p.0].children.insert(name, handle),
            None => self.top_level.push(handle),
        }
        handle
    }

    /// The full slash-separated path from the tree's root to `handle`,
    /// e.g. `"Segment/Tracks/TrackEntry"`.
    pub fn path(&self, handle: Handle) -> String {
        let mut segments = Vec::new();
        let mut current = Some(handle);
        while let Some(h) = current {
            let element = self.get(h);
            segments.push(element.name);
            current = element.parent;
        }
        segments.reverse();
        segments.join("/")
    }

    /// The element's nesting depth, with a top-level element at `0`.
    pub fn level(&self, handle: Handle) -> usize {
        let mut depth = 0;
        let mut current = self.get(handle).parent;
        while let Some(h) = current {
            depth += 1;
            current = self.get(h).parent;
        }
        depth
    }

    /// The number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Whether the tree has no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &'static str, offset: u64) -> Element {
        Element {
            id: Id(0),
            name,
            schema: None,
            offset,
            header_len: 2,
            size: Some(0),
            value: Value::Uint(0),
            children: ContainerMap::default(),
            parent: None,
            track_kinds: HashMap::new(),
        }
    }

    #[test]
    fn insertion_order_preserved_across_names() {
        let mut tree = Tree::new();
        let root = tree.insert(leaf("Segment", 0), None);
        let a = tree.insert(leaf("Cluster", 10), Some(root));
        let b = tree.insert(leaf("Tracks", 20), Some(root));
        let c = tree.insert(leaf("Cluster", 30), Some(root));
        let children: Vec<_> = tree.get(root).children.iter().collect();
        assert_eq!(children, vec![a, b, c]);
        assert_eq!(tree.get(root).children.get_all("Cluster"), &[a, c]);
    }

    #[test]
    fn path_reconstructs_ancestor_chain() {
        let mut tree = Tree::new();
        let segment = tree.insert(leaf("Segment", 0), None);
        let tracks = tree.insert(leaf("Tracks", 5), Some(segment));
        let entry = tree.insert(leaf("TrackEntry", 10), Some(tracks));
        assert_eq!(tree.path(entry), "Segment/Tracks/TrackEntry");
    }

    #[test]
    fn top_level_tracks_multiple_roots() {
        let mut tree = Tree::new();
        let ebml = tree.insert(leaf("Ebml", 0), None);
        let segment = tree.insert(leaf("Segment", 40), None);
        assert_eq!(tree.top_level, vec![ebml, segment]);
    }
}
