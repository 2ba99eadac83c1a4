//! Artifact rewriting for javax to jakarta migration
//!
//! This module provides the engine that moves compiled classes, sources and
//! whole archives from the `javax` namespace to `jakarta`. The functionality
//! is organized into several sub-modules:
//!
//! - `analysis`: entry classification and entry-name rewriting
//! - `core`: class-file constant pool parsing and reserialization
//! - `modification`: text, class, manifest and signature rewriting
//! - `io`: archive, file and directory reading and writing
//!
//! # Example Usage
//!
//! ```no_run
//! use jakartaee_migration::jar::io::{ArchiveMigrator, BufferMode};
//! use jakartaee_migration::Profile;
//! use std::fs::File;
//!
//! let migrator = ArchiveMigrator::new(Profile::Tomcat.table(), BufferMode::Spooled);
//! let input = File::open("hellocgi.jar")?;
//! let mut output = File::create("hellocgi-jakarta.jar")?;
//! let converted = migrator.migrate("hellocgi.jar", input, &mut output, &mut |_| {})?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Sub-modules
pub mod analysis;
pub mod core;
pub mod io;
pub mod modification;

// Re-export the most commonly used functionality for convenience
pub use analysis::{classify, renamed_entry, EntryKind, Route};
pub use self::core::{ClassFile, ClassFormatError};
pub use io::{migrate_directory, migrate_file, ArchiveMigrator, BufferMode};
pub use modification::{rewrite_class, rewrite_names, Manifest, ManifestError};
