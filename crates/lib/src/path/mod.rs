//! Dotted-decimal node paths.
//!
//! A [`NodePath`] is the source of truth for a node's position in the
//! forest: a non-empty, dot-separated sequence of positive integers such as
//! `"2.4.3"`. The first segment selects a root, each further segment a
//! child position. Segment `0` does not exist — child positions start at 1.
//!
//! Paths order the forest as a prefix tree: `P` is an ancestor of `Q`
//! exactly when `Q` extends `P` by at least one segment.

pub mod errors;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use errors::PathError;

/// An owned, validated dotted path.
///
/// Construction always validates, so every `NodePath` in circulation holds
/// at least one segment and only segments `>= 1`.
///
/// ```
/// use mediant::path::NodePath;
/// use std::str::FromStr;
///
/// let path = NodePath::from_str("2.4.3")?;
/// assert_eq!(path.level(), 3);
/// assert_eq!(path.last_segment(), 3);
/// assert_eq!(path.parent().unwrap().to_string(), "2.4");
/// # Ok::<(), mediant::path::PathError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath {
    segments: Vec<i64>,
}

impl NodePath {
    /// Creates a path from raw segments, validating each one.
    ///
    /// # Errors
    /// Returns [`PathError::Empty`] for an empty sequence and
    /// [`PathError::InvalidSegment`] for any segment below 1.
    pub fn from_segments(segments: Vec<i64>) -> Result<Self, PathError> {
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        for &segment in &segments {
            if segment < 1 {
                return Err(PathError::InvalidSegment { segment });
            }
        }
        Ok(NodePath { segments })
    }

    /// Creates the single-segment path of the `segment`-th root.
    pub fn root(segment: i64) -> Result<Self, PathError> {
        Self::from_segments(vec![segment])
    }

    /// The segments, top-down.
    pub fn segments(&self) -> &[i64] {
        &self.segments
    }

    /// The final dotted component.
    pub fn last_segment(&self) -> i64 {
        // Non-empty by construction.
        self.segments[self.segments.len() - 1]
    }

    /// The number of segments. Roots are level 1.
    pub fn level(&self) -> i64 {
        self.segments.len() as i64
    }

    /// Whether this is a root path (a single segment).
    pub fn is_root(&self) -> bool {
        self.segments.len() == 1
    }

    /// The path with the last segment dropped, or `None` for roots.
    pub fn parent(&self) -> Option<NodePath> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(NodePath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// The path extended by one child segment.
    pub fn child(&self, segment: i64) -> Result<NodePath, PathError> {
        if segment < 1 {
            return Err(PathError::InvalidSegment { segment });
        }
        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(NodePath { segments })
    }

    /// The sibling path with the last segment replaced.
    pub fn with_last_segment(&self, segment: i64) -> Result<NodePath, PathError> {
        if segment < 1 {
            return Err(PathError::InvalidSegment { segment });
        }
        let mut segments = self.segments.clone();
        if let Some(last) = segments.last_mut() {
            *last = segment;
        }
        Ok(NodePath { segments })
    }

    /// Strict-prefix ancestor test: `self` is an ancestor of `other` when
    /// `other` extends `self` by at least one segment.
    pub fn is_ancestor_of(&self, other: &NodePath) -> bool {
        other.segments.len() > self.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }

    /// All strict dotted prefixes, root first.
    pub fn ancestors(&self) -> Vec<NodePath> {
        (1..self.segments.len())
            .map(|len| NodePath {
                segments: self.segments[..len].to_vec(),
            })
            .collect()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        let mut segments = Vec::new();
        for (position, component) in s.split('.').enumerate() {
            if component.is_empty() {
                return Err(PathError::EmptyComponent { position });
            }
            let segment: i64 = component
                .parse()
                .map_err(|_| PathError::InvalidComponent {
                    component: component.to_string(),
                })?;
            if segment < 1 {
                return Err(PathError::InvalidSegment { segment });
            }
            segments.push(segment);
        }
        Ok(NodePath { segments })
    }
}

impl TryFrom<&str> for NodePath {
    type Error = PathError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        NodePath::from_str(s)
    }
}

impl Serialize for NodePath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodePath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        NodePath::from_str(&s).map_err(serde::de::Error::custom)
    }
}
