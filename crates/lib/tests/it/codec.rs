use std::str::FromStr;

use mediant::{Matrix, NodePath, codec};

/// Every path with up to three segments drawn from 1..=4.
fn sample_paths() -> Vec<NodePath> {
    let mut paths = Vec::new();
    for a in 1..=4i64 {
        paths.push(NodePath::from_segments(vec![a]).unwrap());
        for b in 1..=4i64 {
            paths.push(NodePath::from_segments(vec![a, b]).unwrap());
            for c in 1..=4i64 {
                paths.push(NodePath::from_segments(vec![a, b, c]).unwrap());
            }
        }
    }
    paths
}

#[test]
fn paper_conformance_anchor() {
    let matrix = codec::from_path(&NodePath::from_str("2.4.3").unwrap());
    assert_eq!(matrix, Matrix::new(65, 82, 23, 29));
    assert_eq!(codec::left(&matrix), 65.0 / 23.0);
    assert_eq!(codec::right(&matrix), 82.0 / 29.0);
    assert_eq!(matrix.determinant(), -1);
}

#[test]
fn path_round_trip_law() {
    for path in sample_paths() {
        let recovered = codec::to_path(&codec::from_path(&path)).expect("round trip");
        assert_eq!(recovered, path);
    }
}

#[test]
fn multiplication_chain_law() {
    for path in sample_paths() {
        let mut expected = codec::root_matrix();
        for &segment in path.segments() {
            expected = expected.multiply(&codec::segment_matrix(segment).expect("valid segment"));
        }
        assert_eq!(codec::from_path(&path), expected, "chain for {path}");
    }
}

#[test]
fn integer_inverse_law() {
    for path in sample_paths() {
        let matrix = codec::from_path(&path);
        assert_eq!(matrix.determinant(), -1, "det for {path}");
        let inverse = matrix.inverse().expect("unimodular node matrix");
        assert_eq!(matrix.multiply(&inverse), Matrix::IDENTITY, "inverse for {path}");
    }
}

#[test]
fn double_transpose_and_adjugate_law() {
    for path in sample_paths() {
        let matrix = codec::from_path(&path);
        assert_eq!(matrix.transpose().transpose(), matrix);
        assert_eq!(matrix.adjugate().adjugate(), matrix);
    }
}

#[test]
fn ancestor_enumeration_without_database() {
    for path in sample_paths() {
        let matrix = codec::from_path(&path);
        let ancestors = codec::ancestor_matrices(matrix.a, matrix.c).expect("valid boundary");
        let expected: Vec<Matrix> = path.ancestors().iter().map(codec::from_path).collect();
        assert_eq!(ancestors, expected, "ancestors for {path}");
    }
}

#[test]
fn ancestor_paths_are_strict_prefixes() {
    for path in sample_paths() {
        let prefixes: Vec<String> = codec::ancestor_paths(&path)
            .iter()
            .map(|p| p.to_string())
            .collect();
        let text = path.to_string();
        for prefix in &prefixes {
            assert!(text.starts_with(&format!("{prefix}.")), "{prefix} vs {text}");
        }
        assert_eq!(prefixes.len() as i64, path.level() - 1);
    }
}

#[test]
fn boundaries_nest_and_siblings_touch_across_samples() {
    for path in sample_paths() {
        let matrix = codec::from_path(&path);
        assert!(codec::left(&matrix) < codec::right(&matrix), "{path}");
        if let Some(parent) = path.parent() {
            let parent_matrix = codec::from_path(&parent);
            assert!(codec::left(&parent_matrix) < codec::left(&matrix), "{path}");
            assert!(codec::right(&matrix) < codec::right(&parent_matrix), "{path}");
        }
        let next = path.with_last_segment(path.last_segment() + 1).unwrap();
        assert_eq!(
            codec::right(&matrix),
            codec::left(&codec::from_path(&next)),
            "touch at {path}"
        );
    }
}

#[test]
fn migration_primitive_matches_matrix_derivation() {
    for path in sample_paths() {
        let matrix = codec::from_path(&path);
        assert_eq!(
            codec::columns_for_path(&path),
            (codec::left(&matrix), codec::right(&matrix), path.level())
        );
    }
}
