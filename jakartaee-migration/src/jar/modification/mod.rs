//! Content rewriting for migrated artifacts
//!
//! Each sub-module handles one kind of payload:
//!
//! - `text`: qualified-name substitution over raw bytes
//! - `class`: constant pool rewriting for compiled classes
//! - `manifest`: JAR manifest parsing and post-migration repair
//! - `signature`: detection of signature files that must be dropped

pub mod class;
pub mod manifest;
pub mod signature;
pub mod text;

// Re-export commonly used modification functionality
pub use class::rewrite_class;
pub use manifest::{Manifest, ManifestError, ManifestRepair, MANIFEST_NAME, MIGRATED_MARKER};
pub use signature::{is_signature_file, SignatureRecord};
pub use text::{rewrite_names, rewrite_str};
