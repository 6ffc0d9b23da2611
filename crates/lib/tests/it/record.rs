use std::sync::Arc;

use mediant::store::{MemoryStore, Value};
use mediant::{Forest, TreeSchema, codec};

use crate::helpers::{add_child, add_root, assert_forest_valid, setup_forest};

#[test]
fn loaded_records_expose_their_tree_columns_read_only() {
    let forest = setup_forest();
    add_root(&forest, "a");
    let mut record = forest.find("1").unwrap().expect("present");

    assert_eq!(record.path().unwrap().to_string(), "1");
    assert_eq!((record.left(), record.right(), record.level()), (1.0, 2.0, 1));
    assert!(record.is_root());
    assert!(!record.is_new());

    for column in ["path", "lft", "rgt", "level"] {
        let err = record.set(column, 5.0).expect_err("guarded");
        assert!(err.is_read_only(), "column {column}");
    }
}

#[test]
fn protect_readonly_opt_out_allows_diagnostic_writes() {
    let forest = setup_forest();
    add_root(&forest, "a");
    let mut record = forest.find("1").unwrap().expect("present");

    record.protect_readonly(false);
    record.set("path", "4.2").expect("unprotected write");
    assert_eq!(record.path().unwrap().to_string(), "4.2");
    assert_eq!(record.level(), 2);

    record.protect_readonly(true);
    assert!(record.set("path", "1").is_err());
}

#[test]
fn node_matrix_matches_the_codec() {
    let forest = setup_forest();
    let a = add_root(&forest, "a");
    let b = add_child(&forest, &a, "b");
    add_child(&forest, &b, "c");

    let record = forest.find("1.1.1").unwrap().expect("present");
    let matrix = record.node_matrix().expect("has path");
    assert_eq!(matrix, codec::from_path(record.path().unwrap()));
    assert_eq!(matrix.determinant(), -1);
    assert_eq!(codec::left(&matrix), record.left());
    assert_eq!(codec::right(&matrix), record.right());
}

#[test]
fn payload_round_trips_through_the_store() {
    let forest = setup_forest();
    let mut node = forest.node();
    node.set("title", "first").unwrap();
    node.set("weight", 7i64).unwrap();
    node.set("score", 0.5).unwrap();
    node.save(None).expect("save");

    let reloaded = forest.find("1").unwrap().expect("present");
    assert_eq!(reloaded.get("title"), Some(&Value::Text("first".into())));
    assert_eq!(reloaded.get("weight"), Some(&Value::Integer(7)));
    assert_eq!(reloaded.get("score"), Some(&Value::Real(0.5)));
    assert_eq!(reloaded.payload().len(), 3);
}

#[test]
fn refresh_reloads_the_authoritative_row() {
    let forest = setup_forest();
    add_root(&forest, "a");
    let mut stale = forest.find("1").unwrap().expect("present");

    // Another record mutates the same row.
    let mut other = forest.find("1").unwrap().expect("present");
    other.set("name", "renamed").unwrap();
    other.save(None).expect("save");

    assert_eq!(stale.get("name"), Some(&Value::Text("a".into())));
    stale.refresh().expect("refresh");
    assert_eq!(stale.get("name"), Some(&Value::Text("renamed".into())));
}

#[test]
fn refresh_requires_persistence() {
    let forest = setup_forest();
    let mut record = forest.node();
    assert!(record.refresh().is_err());
}

#[test]
fn custom_column_names_flow_through_every_layer() {
    let schema = TreeSchema {
        table: "pages".to_string(),
        id_column: "pk".to_string(),
        path_column: "tree_path".to_string(),
        left_column: "interval_lo".to_string(),
        right_column: "interval_hi".to_string(),
        level_column: "depth".to_string(),
    };
    let forest = Forest::new(Arc::new(MemoryStore::new()), schema);

    let a = add_root(&forest, "a");
    let mut c1 = add_child(&forest, &a, "c1");
    let c2 = add_child(&forest, &a, "c2");
    add_child(&forest, &c1, "g1");

    let moved = c1.save_after(&c2, None).expect("save_after");
    assert!(moved);
    let children = a.relative_query().unwrap().children().all().unwrap();
    assert_eq!(
        children
            .iter()
            .map(|r| r.path().unwrap().to_string())
            .collect::<Vec<_>>(),
        vec!["1.1", "1.2"]
    );
    assert_forest_valid(&forest);

    // The guard follows the configured names, not the defaults.
    let mut record = forest.find("1.1").unwrap().expect("present");
    assert_eq!(record.path_column(), "tree_path");
    assert_eq!(record.left_column(), "interval_lo");
    assert_eq!(record.right_column(), "interval_hi");
    assert_eq!(record.level_column(), "depth");
    assert!(record.set("interval_lo", 2.0).is_err());
    assert!(record.set("lft", 2.0).is_ok(), "default name is plain payload");
}

#[test]
fn conformance_matrix_survives_a_live_forest() {
    let forest = setup_forest();
    let mut r1 = forest.node();
    r1.save(None).unwrap();
    let mut r2 = forest.node();
    r2.save(None).unwrap();
    let mut c = forest.node();
    c.save_into(&r2, None).unwrap();
    for _ in 0..3 {
        let mut filler = forest.node();
        filler.save_into(&c, None).unwrap();
    }

    // Path 2.1.3 exists now; its matrix is the paper anchor's cousin.
    let node = forest.find("2.1.3").unwrap().expect("present");
    assert_eq!(node.node_matrix(), Some(codec::from_path(node.path().unwrap())));
    assert_forest_valid(&forest);
}

#[test]
fn can_move_guards_against_own_subtree_targets() {
    let forest = setup_forest();
    let a = add_root(&forest, "a");
    let c1 = add_child(&forest, &a, "c1");
    let g1 = add_child(&forest, &c1, "g1");

    assert!(!c1.can_move(c1.path().unwrap()));
    assert!(!c1.can_move(g1.path().unwrap()));
    assert!(c1.can_move(a.path().unwrap()));
    assert!(g1.can_move(c1.path().unwrap()));
}
