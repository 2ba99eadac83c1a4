//! Analysis modules for routing artifacts
//!
//! This module decides, from names and leading bytes only, which rewriter
//! an archive entry or stand-alone file goes through and whether its name
//! has to change.

pub mod scanner;

// Re-export commonly used analysis functionality
pub use scanner::{
    classify, entry_kind, is_archive_name, is_text_name, renamed_entry, sniff_file, EntryKind,
    Route, SERVICES_DIR,
};
