//! Navigable paths.
//!
//! A [`NavigablePath`] is the structural address of a domain construct:
//! a root name (query root or correlation) plus a chain of attribute-name
//! segments. Paths are the sole addressing mechanism between domain
//! constructs and relational constructs, so equality and hashing are
//! structural.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One attribute-name step of a navigable path, optionally narrowed to a
/// subtype via a `treat` annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathSegment {
    pub name: String,
    /// Type-narrowing target: `treat(p.address as HomeAddress)` carries
    /// `Some("HomeAddress")`. A treated path binds independently of the
    /// untreated one.
    pub treat_target: Option<String>,
}

impl PathSegment {
    pub fn named(name: impl Into<String>) -> Self {
        PathSegment {
            name: name.into(),
            treat_target: None,
        }
    }
}

/// Hierarchical identifier rooted at a query root or correlation.
///
/// Two paths are equal iff their root and segment chains are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NavigablePath {
    root: String,
    segments: Vec<PathSegment>,
}

impl NavigablePath {
    /// A path consisting only of a root name.
    pub fn root(name: impl Into<String>) -> Self {
        NavigablePath {
            root: name.into(),
            segments: Vec::new(),
        }
    }

    /// Extend this path with one attribute segment.
    pub fn append(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::named(name));
        NavigablePath {
            root: self.root.clone(),
            segments,
        }
    }

    /// Extend this path with a type-narrowed segment.
    pub fn append_treated(&self, name: impl Into<String>, target: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment {
            name: name.into(),
            treat_target: Some(target.into()),
        });
        NavigablePath {
            root: self.root.clone(),
            segments,
        }
    }

    pub fn root_name(&self) -> &str {
        &self.root
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The final segment, or `None` for a bare root path.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Split into `(parent, last segment)`. Returns `None` for a bare root.
    pub fn parent(&self) -> Option<(NavigablePath, &PathSegment)> {
        let last = self.segments.last()?;
        Some((
            NavigablePath {
                root: self.root.clone(),
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            },
            last,
        ))
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for NavigablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for segment in &self.segments {
            match &segment.treat_target {
                Some(target) => write!(f, ".treat({} as {})", segment.name, target)?,
                None => write!(f, ".{}", segment.name)?,
            }
        }
        Ok(())
    }
}
