//! Namespace mapping rules and the longest-prefix lookup table built from them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single `source prefix -> target prefix` rewrite, written with `.` separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    pub source: String,
    pub target: String,
}

impl MappingRule {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        MappingRule {
            source: source.into(),
            target: target.into(),
        }
    }

    /// A rule that maps a prefix onto itself, shadowing a shorter rule.
    pub fn exclusion(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        MappingRule {
            target: prefix.clone(),
            source: prefix,
        }
    }

    pub fn is_exclusion(&self) -> bool {
        self.source == self.target
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("duplicate source pattern {0:?}")]
    DuplicateSource(String),

    #[error("pattern {0:?} is not a dotted qualified name")]
    MalformedPattern(String),

    #[error("mapping table is empty")]
    Empty,

    #[error("mapping table is not valid JSON: {0}")]
    Json(String),
}

/// Result of a successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixMatch<'t> {
    /// Number of leading segments covered by the rule.
    pub segments: usize,
    /// Dotted target prefix that replaces them.
    pub target: &'t str,
}

/// Immutable longest-prefix lookup over a set of [`MappingRule`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTable {
    rules: BTreeMap<String, String>,
    roots: BTreeSet<String>,
    max_segments: usize,
}

impl MappingTable {
    /// Build a table, rejecting duplicate or malformed patterns.
    pub fn new(rules: impl IntoIterator<Item = MappingRule>) -> Result<Self, MappingError> {
        let mut table = BTreeMap::new();
        let mut roots = BTreeSet::new();
        let mut max_segments = 0;

        for rule in rules {
            for pattern in [&rule.source, &rule.target] {
                if !is_qualified_name(pattern) {
                    return Err(MappingError::MalformedPattern(pattern.clone()));
                }
            }
            let segments = rule.source.split('.').count();
            max_segments = max_segments.max(segments);
            if let Some(root) = rule.source.split('.').next() {
                roots.insert(root.to_owned());
            }
            if table.contains_key(&rule.source) {
                return Err(MappingError::DuplicateSource(rule.source));
            }
            table.insert(rule.source, rule.target);
        }

        if table.is_empty() {
            return Err(MappingError::Empty);
        }

        Ok(MappingTable {
            rules: table,
            roots,
            max_segments,
        })
    }

    /// Build a table from vetted static data without validation.
    pub(crate) fn from_static(rules: &[(&str, &str)]) -> Self {
        let mut table = BTreeMap::new();
        let mut roots = BTreeSet::new();
        let mut max_segments = 0;
        for (source, target) in rules {
            max_segments = max_segments.max(source.split('.').count());
            if let Some(root) = source.split('.').next() {
                roots.insert((*root).to_owned());
            }
            table.insert((*source).to_owned(), (*target).to_owned());
        }
        MappingTable {
            rules: table,
            roots,
            max_segments,
        }
    }

    /// Parse a JSON array of `{"source": .., "target": ..}` objects.
    pub fn from_json(json: &str) -> Result<Self, MappingError> {
        let rules: Vec<MappingRule> =
            serde_json::from_str(json).map_err(|err| MappingError::Json(err.to_string()))?;
        Self::new(rules)
    }

    pub fn rules(&self) -> impl Iterator<Item = MappingRule> + '_ {
        self.rules
            .iter()
            .map(|(source, target)| MappingRule::new(source.as_str(), target.as_str()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// `true` if some rule starts with this first segment (e.g. `javax`).
    pub fn is_root(&self, segment: &str) -> bool {
        self.roots.contains(segment)
    }

    /// Segment count of the longest source pattern.
    pub fn max_segments(&self) -> usize {
        self.max_segments
    }

    /// Find the longest rule covering a prefix of `segments`.
    ///
    /// Exclusion rules still win the match, and are reported as `None` since
    /// nothing needs rewriting.
    pub fn match_segments(&self, segments: &[&str]) -> Option<PrefixMatch<'_>> {
        let longest = segments.len().min(self.max_segments);
        for count in (1..=longest).rev() {
            let key = segments[..count].join(".");
            if let Some((source, target)) = self.rules.get_key_value(&key) {
                if source == target {
                    return None;
                }
                return Some(PrefixMatch {
                    segments: count,
                    target,
                });
            }
        }
        None
    }

    /// Map a qualified name, keeping the separator (`.` or `/`) it was written with.
    pub fn resolve(&self, qualified_name: &str) -> Option<String> {
        let separator = if qualified_name.contains('/') { "/" } else { "." };
        let segments: Vec<&str> = qualified_name.split(separator).collect();
        let matched = self.match_segments(&segments)?;

        let mut mapped: Vec<&str> = matched.target.split('.').collect();
        mapped.extend_from_slice(&segments[matched.segments..]);
        Some(mapped.join(separator))
    }
}

fn is_qualified_name(pattern: &str) -> bool {
    !pattern.is_empty()
        && pattern.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'$')
        })
}
