//! I/O modules for reading sources and writing migrated output
//!
//! This module contains the archive processor and the file and directory
//! walkers built on top of it. Output is always staged next to its
//! destination and moved into place once complete.

pub mod directory;
pub mod file;
pub mod spool;
pub mod staging;
pub mod writer;

// Re-export commonly used I/O functionality
pub use directory::migrate_directory;
pub use file::migrate_file;
pub use writer::{ArchiveMigrator, BufferMode};
