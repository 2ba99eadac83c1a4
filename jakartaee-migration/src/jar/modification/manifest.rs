//! `META-INF/MANIFEST.MF` reading, writing and post-migration repair.
//!
//! The format is line based: `Name: value` attributes, lines wrapped at 72
//! bytes with continuation lines starting with a single space, and sections
//! separated by blank lines. The first section holds the main attributes;
//! every later section describes one entry through its `Name` attribute.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::debug;

use crate::jar::modification::text::rewrite_str;
use crate::mapping::MappingTable;

pub const MANIFEST_NAME: &str = "META-INF/MANIFEST.MF";

/// Marker inserted between the original version and the engine version.
pub const MIGRATED_MARKER: &str = "-migrated-";

const IMPLEMENTATION_VERSION: &str = "Implementation-Version";
const NAME: &str = "Name";
const MAX_LINE_BYTES: usize = 72;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("manifest is not valid UTF-8")]
    NotUtf8,

    #[error("line {line} is not a `name: value` attribute")]
    MalformedLine { line: usize },

    #[error("continuation on line {line} has no attribute to continue")]
    OrphanContinuation { line: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// One block of attributes, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub attributes: Vec<Attribute>,
}

impl Section {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
            .map(|attr| attr.value.as_str())
    }

    /// The entry this section describes.
    pub fn name(&self) -> Option<&str> {
        self.get(NAME)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut String> {
        self.attributes
            .iter_mut()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
            .map(|attr| &mut attr.value)
    }

    fn remove_digests(&mut self) -> usize {
        let before = self.attributes.len();
        self.attributes.retain(|attr| !is_digest(&attr.name));
        before - self.attributes.len()
    }

    fn is_name_only(&self) -> bool {
        self.attributes
            .iter()
            .all(|attr| attr.name.eq_ignore_ascii_case(NAME))
    }
}

/// What happened to an archive's entries, as seen by its manifest.
#[derive(Debug, Default)]
pub struct ManifestRepair<'a> {
    /// Original names of entries whose content was rewritten.
    pub changed: BTreeSet<&'a str>,
    /// Original name to new name, for renamed entries.
    pub renamed: BTreeMap<&'a str, &'a str>,
    /// Signature files are being removed, so no digest stays meaningful.
    pub strip_all_digests: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub main: Section,
    pub entries: Vec<Section>,
}

impl Manifest {
    pub fn parse(bytes: &[u8]) -> Result<Self, ManifestError> {
        let text = std::str::from_utf8(bytes).map_err(|_| ManifestError::NotUtf8)?;

        let mut sections: Vec<Section> = vec![Section::default()];
        let mut in_blank_run = false;

        for (number, line) in lines(text).enumerate().map(|(i, line)| (i + 1, line)) {
            if line.is_empty() {
                in_blank_run = true;
                continue;
            }
            if in_blank_run {
                sections.push(Section::default());
                in_blank_run = false;
            }
            let Some(section) = sections.last_mut() else {
                continue;
            };

            if let Some(rest) = line.strip_prefix(' ') {
                let Some(attr) = section.attributes.last_mut() else {
                    return Err(ManifestError::OrphanContinuation { line: number });
                };
                attr.value.push_str(rest);
                continue;
            }

            let Some((name, value)) = line.split_once(':') else {
                return Err(ManifestError::MalformedLine { line: number });
            };
            if name.is_empty() || name.contains(' ') {
                return Err(ManifestError::MalformedLine { line: number });
            }
            section.attributes.push(Attribute {
                name: name.to_owned(),
                value: value.strip_prefix(' ').unwrap_or(value).to_owned(),
            });
        }

        let mut sections = sections.into_iter();
        let main = sections.next().unwrap_or_default();
        let entries = sections
            .filter(|section| !section.attributes.is_empty())
            .collect();
        Ok(Manifest { main, entries })
    }

    /// Serialize with CRLF line endings and 72-byte line wrapping.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for section in std::iter::once(&self.main).chain(&self.entries) {
            for attr in &section.attributes {
                write_attribute(&mut out, attr);
            }
            out.extend_from_slice(b"\r\n");
        }
        out
    }

    pub fn implementation_version(&self) -> Option<&str> {
        self.main.get(IMPLEMENTATION_VERSION)
    }

    pub fn entry(&self, name: &str) -> Option<&Section> {
        self.entries.iter().find(|section| section.name() == Some(name))
    }

    /// Pass every attribute value except entry names through the text rewriter.
    pub fn rewrite_values(&mut self, table: &MappingTable) -> bool {
        let mut changed = false;
        for section in std::iter::once(&mut self.main).chain(&mut self.entries) {
            for attr in &mut section.attributes {
                if attr.name.eq_ignore_ascii_case(NAME) {
                    continue;
                }
                if let Some(value) = rewrite_str(&attr.value, table) {
                    debug!("manifest attribute {}: {} -> {}", attr.name, attr.value, value);
                    attr.value = value;
                    changed = true;
                }
            }
        }
        changed
    }

    /// Append `-migrated-<engine_version>` to `Implementation-Version`.
    ///
    /// A value that already carries the marker is left as it is.
    pub fn stamp_version(&mut self, engine_version: &str) -> bool {
        let Some(version) = self.main.get_mut(IMPLEMENTATION_VERSION) else {
            return false;
        };
        if version.contains(MIGRATED_MARKER) {
            return false;
        }
        version.push_str(MIGRATED_MARKER);
        version.push_str(engine_version);
        true
    }

    /// Bring per-entry sections in line with a converted archive.
    pub fn repair(&mut self, repair: &ManifestRepair<'_>, engine_version: &str) {
        self.stamp_version(engine_version);

        if repair.strip_all_digests {
            self.main.remove_digests();
        }

        for section in &mut self.entries {
            let Some(name) = section.name().map(str::to_owned) else {
                continue;
            };
            if repair.strip_all_digests || repair.changed.contains(name.as_str()) {
                let removed = section.remove_digests();
                if removed > 0 {
                    debug!("removed {removed} digest attribute(s) of {name}");
                }
            }
            if let Some(renamed) = repair.renamed.get(name.as_str()) {
                if let Some(value) = section.get_mut(NAME) {
                    *value = (*renamed).to_owned();
                }
            }
        }

        self.entries.retain(|section| !section.is_name_only());
    }
}

fn is_digest(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with("-digest")
}

/// Split on CRLF, LF or lone CR without yielding a trailing empty line.
fn lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let Some(end) = rest.find(['\r', '\n']) else {
            let line = rest;
            rest = "";
            return Some(line);
        };
        let line = &rest[..end];
        let skip = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[end + skip..];
        Some(line)
    })
}

fn write_attribute(out: &mut Vec<u8>, attr: &Attribute) {
    let line = format!("{}: {}", attr.name, attr.value);
    let mut remaining = line.as_str();
    let mut limit = MAX_LINE_BYTES;
    let mut first = true;

    while !remaining.is_empty() {
        let mut cut = remaining.len().min(limit);
        while !remaining.is_char_boundary(cut) {
            cut -= 1;
        }
        if !first {
            out.push(b' ');
        }
        out.extend_from_slice(remaining[..cut].as_bytes());
        out.extend_from_slice(b"\r\n");
        remaining = &remaining[cut..];
        first = false;
        limit = MAX_LINE_BYTES - 1;
    }
}
