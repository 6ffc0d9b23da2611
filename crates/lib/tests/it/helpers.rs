use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use mediant::store::{MemoryStore, Select, Value};
use mediant::{Forest, NodePath, NodeRecord, codec};

/// Creates an empty forest over an in-memory store with the default schema.
pub fn setup_forest() -> Forest {
    Forest::with_defaults(Arc::new(MemoryStore::new()))
}

/// Creates and saves a new root carrying a `name` payload.
pub fn add_root(forest: &Forest, name: &str) -> NodeRecord {
    let mut node = forest.node();
    node.set("name", name).expect("payload is writable");
    node.save(None).expect("Failed to save root");
    node
}

/// Creates and saves a new last child of `parent` carrying a `name` payload.
pub fn add_child(forest: &Forest, parent: &NodeRecord, name: &str) -> NodeRecord {
    let mut node = forest.node();
    node.set("name", name).expect("payload is writable");
    node.save_into(parent, None).expect("Failed to save child");
    node
}

/// The `name` payload of a record.
pub fn name(record: &NodeRecord) -> String {
    record
        .get("name")
        .and_then(|value| value.as_str())
        .unwrap_or("<unnamed>")
        .to_string()
}

/// The `name` payloads of a slice of records, in order.
pub fn names(records: &[NodeRecord]) -> Vec<String> {
    records.iter().map(name).collect()
}

/// The dotted paths of a slice of records, in order.
pub fn paths(records: &[NodeRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| record.path().expect("persisted record").to_string())
        .collect()
}

/// Audits every tree invariant over the whole forest: determinants,
/// boundary derivation, interval nesting vs. path prefixes, sibling touch
/// and contiguity, and level consistency.
pub fn assert_forest_valid(forest: &Forest) {
    let schema = forest.schema();
    let rows = forest
        .store()
        .select(&Select::default())
        .expect("Failed to read forest");

    let mut nodes: Vec<(NodePath, f64, f64, i64)> = Vec::new();
    for row in &rows {
        let text = row
            .get(&schema.path_column)
            .and_then(Value::as_str)
            .expect("row carries a path");
        let path = NodePath::from_str(text).expect("stored path is valid");
        let left = row
            .get(&schema.left_column)
            .and_then(Value::as_f64)
            .expect("row carries a left boundary");
        let right = row
            .get(&schema.right_column)
            .and_then(Value::as_f64)
            .expect("row carries a right boundary");
        let level = row
            .get(&schema.level_column)
            .and_then(Value::as_i64)
            .expect("row carries a level");
        nodes.push((path, left, right, level));
    }

    // Per-row invariants: columns derive from the path's matrix.
    for (path, left, right, level) in &nodes {
        let matrix = codec::from_path(path);
        assert_eq!(matrix.determinant(), -1, "det for {path}");
        assert_eq!(*left, codec::left(&matrix), "left for {path}");
        assert_eq!(*right, codec::right(&matrix), "right for {path}");
        assert_eq!(*level, path.level(), "level for {path}");
        assert!(left < right, "interval for {path}");
    }

    // Paths are unique.
    for (i, (path, ..)) in nodes.iter().enumerate() {
        for (other, ..) in &nodes[i + 1..] {
            assert_ne!(path, other, "duplicate path {path}");
        }
    }

    // Strict interval containment coincides with path ancestry.
    for (x_path, x_left, x_right, _) in &nodes {
        for (y_path, y_left, y_right, _) in &nodes {
            if x_path == y_path {
                continue;
            }
            let contained = y_left > x_left && y_right < x_right;
            assert_eq!(
                contained,
                x_path.is_ancestor_of(y_path),
                "containment of {y_path} in {x_path}"
            );
        }
    }

    // Siblings: contiguous last segments starting at 1, touching intervals.
    let mut families: BTreeMap<String, Vec<(i64, f64, f64)>> = BTreeMap::new();
    for (path, left, right, _) in &nodes {
        let family = path
            .parent()
            .map(|parent| parent.to_string())
            .unwrap_or_default();
        families
            .entry(family)
            .or_default()
            .push((path.last_segment(), *left, *right));
    }
    for (family, mut siblings) in families {
        siblings.sort_by(|a, b| a.1.total_cmp(&b.1));
        for (position, (segment, _, _)) in siblings.iter().enumerate() {
            assert_eq!(
                *segment,
                position as i64 + 1,
                "segment contiguity under '{family}'"
            );
        }
        for pair in siblings.windows(2) {
            assert_eq!(
                pair[0].2, pair[1].1,
                "siblings must touch under '{family}'"
            );
        }
    }
}
