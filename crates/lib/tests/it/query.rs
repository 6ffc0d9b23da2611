use mediant::{Forest, NodeRecord, TreeQuery};

use crate::helpers::{add_child, add_root, names, paths, setup_forest};

/// Two roots; `a` carries three children, the middle one a grandchild.
fn populated() -> (Forest, NodeRecord, Vec<NodeRecord>) {
    let forest = setup_forest();
    let a = add_root(&forest, "a");
    add_root(&forest, "b");
    let c1 = add_child(&forest, &a, "c1");
    let c2 = add_child(&forest, &a, "c2");
    let c3 = add_child(&forest, &a, "c3");
    add_child(&forest, &c2, "g1");
    (forest, a, vec![c1, c2, c3])
}

#[test]
fn children_and_descendants() {
    let (_, a, _) = populated();
    let query = a.relative_query().unwrap();
    assert_eq!(paths(&query.children().all().unwrap()), vec!["1.1", "1.2", "1.3"]);

    let descendants = a
        .relative_query()
        .unwrap()
        .children()
        .include_descendants()
        .all()
        .unwrap();
    assert_eq!(paths(&descendants), vec!["1.1", "1.2", "1.2.1", "1.3"]);

    let with_self = a
        .relative_query()
        .unwrap()
        .children()
        .include_self()
        .include_descendants()
        .all()
        .unwrap();
    assert_eq!(paths(&with_self), vec!["1", "1.1", "1.2", "1.2.1", "1.3"]);
}

#[test]
fn parent_and_ancestors() {
    let (forest, _, _) = populated();
    let g1 = forest.find("1.2.1").unwrap().expect("grandchild");

    let parent = g1
        .relative_query()
        .unwrap()
        .parent()
        .one()
        .unwrap()
        .expect("has parent");
    assert_eq!(parent.path().unwrap().to_string(), "1.2");

    let ancestors = g1
        .relative_query()
        .unwrap()
        .parent()
        .include_ancestors()
        .all()
        .unwrap();
    assert_eq!(paths(&ancestors), vec!["1", "1.2"]);

    let root = forest.find("1").unwrap().expect("root");
    assert!(root.relative_query().unwrap().parent().one().unwrap().is_none());
}

#[test]
fn siblings_in_both_directions() {
    let (_, _, children) = populated();
    let c2 = &children[1];

    let siblings = c2.relative_query().unwrap().siblings().all().unwrap();
    assert_eq!(names(&siblings), vec!["c1", "c3"]);

    let with_self = c2
        .relative_query()
        .unwrap()
        .siblings()
        .include_self()
        .all()
        .unwrap();
    assert_eq!(names(&with_self), vec!["c1", "c2", "c3"]);

    // Nearest-first in each direction.
    let next = c2
        .relative_query()
        .unwrap()
        .siblings()
        .next()
        .one()
        .unwrap()
        .expect("has next");
    assert_eq!(names(&[next]), vec!["c3"]);

    let previous = c2
        .relative_query()
        .unwrap()
        .siblings()
        .previous()
        .one()
        .unwrap()
        .expect("has previous");
    assert_eq!(names(&[previous]), vec!["c1"]);

    let c1 = &children[0];
    assert!(
        c1.relative_query()
            .unwrap()
            .siblings()
            .previous()
            .one()
            .unwrap()
            .is_none()
    );
}

#[test]
fn root_siblings_span_the_forest_top() {
    let (forest, a, _) = populated();
    let siblings = a.relative_query().unwrap().siblings().all().unwrap();
    assert_eq!(names(&siblings), vec!["b"]);

    let b = forest.find("2").unwrap().expect("root b");
    let previous = b
        .relative_query()
        .unwrap()
        .siblings()
        .previous()
        .one()
        .unwrap()
        .expect("a precedes b");
    assert_eq!(names(&[previous]), vec!["a"]);
}

#[test]
fn roots_scope_lists_the_forest() {
    let (forest, _, _) = populated();
    let roots = forest.roots().unwrap();
    assert_eq!(paths(&roots), vec!["1", "2"]);
    assert_eq!(names(&roots), vec!["a", "b"]);
}

#[test]
fn excluding_scopes_cut_out_the_reference() {
    let (forest, _, children) = populated();
    let c2 = &children[1];
    let total = forest.count().unwrap();
    assert_eq!(total, 6);

    let without_subtree = c2
        .relative_query()
        .unwrap()
        .excluding_self()
        .excluding_descendants()
        .all()
        .unwrap();
    assert_eq!(paths(&without_subtree), vec!["1", "1.1", "1.3", "2"]);

    let without_self = c2.relative_query().unwrap().excluding_self().all().unwrap();
    assert_eq!(paths(&without_self), vec!["1", "1.1", "1.2.1", "1.3", "2"]);

    let without_descendants = c2
        .relative_query()
        .unwrap()
        .excluding_descendants()
        .all()
        .unwrap();
    assert_eq!(paths(&without_descendants), vec!["1", "1.1", "1.2", "1.3", "2"]);
}

#[test]
fn reverse_and_natural_flip_the_order() {
    let (_, a, _) = populated();
    let reversed = a.relative_query().unwrap().children().reverse().all().unwrap();
    assert_eq!(paths(&reversed), vec!["1.3", "1.2", "1.1"]);

    let restored = a
        .relative_query()
        .unwrap()
        .children()
        .reverse()
        .natural()
        .all()
        .unwrap();
    assert_eq!(paths(&restored), vec!["1.1", "1.2", "1.3"]);

    // previous is nearest-first; reverse flips it back to natural order.
    let (_, _, children) = populated();
    let c3 = &children[2];
    let previous = c3.relative_query().unwrap().siblings().previous().all().unwrap();
    assert_eq!(names(&previous), vec!["c2", "c1"]);
    let reversed = c3
        .relative_query()
        .unwrap()
        .siblings()
        .previous()
        .reverse()
        .all()
        .unwrap();
    assert_eq!(names(&reversed), vec!["c1", "c2"]);
}

#[test]
fn count_matches_all() {
    let (_, a, _) = populated();
    let query = a.relative_query().unwrap().children().include_descendants();
    assert_eq!(query.count().unwrap(), query.all().unwrap().len());
}

/// All permutations of `items`, by recursive selection.
fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    if items.is_empty() {
        return vec![Vec::new()];
    }
    let mut out = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let chosen = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, chosen.clone());
            out.push(tail);
        }
    }
    out
}

type Token = (&'static str, fn(TreeQuery) -> TreeQuery);

/// Applying commuting tokens in any order must produce the same rows.
#[test]
fn token_order_does_not_matter() {
    let (_, a, children) = populated();
    let c2 = &children[1];

    let chains: Vec<(&NodeRecord, Vec<Token>)> = vec![
        (
            c2,
            vec![
                ("siblings", TreeQuery::siblings),
                ("next", TreeQuery::next),
                ("include_self", TreeQuery::include_self),
            ],
        ),
        (
            &a,
            vec![
                ("children", TreeQuery::children),
                ("include_descendants", TreeQuery::include_descendants),
                ("include_self", TreeQuery::include_self),
            ],
        ),
        (
            c2,
            vec![
                ("parent", TreeQuery::parent),
                ("include_ancestors", TreeQuery::include_ancestors),
            ],
        ),
        (
            c2,
            vec![
                ("siblings", TreeQuery::siblings),
                ("previous", TreeQuery::previous),
                ("include_self", TreeQuery::include_self),
                ("reverse", TreeQuery::reverse),
            ],
        ),
        (
            c2,
            vec![
                ("excluding_self", TreeQuery::excluding_self),
                ("excluding_descendants", TreeQuery::excluding_descendants),
            ],
        ),
    ];

    for (record, tokens) in chains {
        let mut expected: Option<Vec<String>> = None;
        for permutation in permutations(&tokens) {
            let mut query = record.relative_query().unwrap();
            let mut applied = Vec::new();
            for (label, token) in &permutation {
                query = token(query);
                applied.push(*label);
            }
            let result = paths(&query.all().unwrap());
            match &expected {
                None => expected = Some(result),
                Some(expected) => assert_eq!(
                    &result, expected,
                    "permutation {applied:?} changed the row set"
                ),
            }
        }
    }
}

#[test]
fn queries_on_unsaved_records_fail_cleanly() {
    let forest = setup_forest();
    let record = forest.node();
    assert!(record.relative_query().is_err());
}
