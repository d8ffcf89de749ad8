//! Query helpers for code that already has a parsed [`Tree`] in hand:
//! walking up to the nearest ancestor of a given name, or walking down
//! to every descendant of a given name.

use std::collections::HashSet;

use crate::tree::{Handle, Tree};

/// Walks upward from `start` (inclusive) and returns the first ancestor
/// (or `start` itself) whose name is `name`.
pub fn closest(tree: &Tree, start: Handle, name: &str) -> Option<Handle> {
    let mut current = Some(start);
    while let Some(h) = current {
        if tree.get(h).name == name {
            return Some(h);
        }
        current = tree.get(h).parent;
    }
    None
}

/// Preorder search of every descendant of `start` (`start` itself is
/// not included) whose name is `name`.
///
/// Dedups by handle identity: a node reached through more than one
/// traversal path (possible if a caller merges results from several
/// overlapping `start` points) is only reported once.
pub fn find(tree: &Tree, start: Handle, name: &str) -> Vec<Handle> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut stack: Vec<Handle> = tree.get(start).children.iter().rev().collect();

    while let Some(handle) = stack.pop() {
        if !seen.insert(handle) {
            continue;
        }
        if tree.get(handle).name == name {
            out.push(handle);
        }
        stack.extend(tree.get(handle).children.iter().rev());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{ContainerMap, Element, Value};
    use crate::vint::Id;

    fn leaf(name: &'static str) -> Element {
        Element {
            id: Id(0),
            name,
            schema: None,
            offset: 0,
            header_len: 2,
            size: Some(0),
            value: Value::Uint(0),
            children: ContainerMap::default(),
            track_kinds: Default::default(),
            parent: None,
        }
    }

    #[test]
    fn closest_walks_up_to_matching_ancestor() {
        let mut tree = Tree::new();
        let segment = tree.insert(leaf("Segment"), None);
        let tracks = tree.insert(leaf("Tracks"), Some(segment));
        let entry = tree.insert(leaf("TrackEntry"), Some(tracks));
        assert_eq!(closest(&tree, entry, "Segment"), Some(segment));
        assert_eq!(closest(&tree, entry, "TrackEntry"), Some(entry));
        assert_eq!(closest(&tree, entry, "Cues"), None);
    }

    #[test]
    fn find_is_preorder_and_recurses_past_nonmatching_nodes() {
        let mut tree = Tree::new();
        let tracks = tree.insert(leaf("Tracks"), None);
        let a = tree.insert(leaf("TrackEntry"), Some(tracks));
        let video = tree.insert(leaf("Video"), Some(a));
        let _pixel_width = tree.insert(leaf("PixelWidth"), Some(video));
        let b = tree.insert(leaf("TrackEntry"), Some(tracks));

        let entries = find(&tree, tracks, "TrackEntry");
        assert_eq!(entries, vec![a, b]);
    }
}
