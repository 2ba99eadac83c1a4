//! Error types for the migration engine.
//!
//! Data-dependent failures are reported through [`MigrationError`]. Misuse of
//! the [`Migration`](crate::Migration) state machine is reported through the
//! separate [`IllegalState`] type so callers can tell a programming error
//! apart from a bad input.

use std::path::PathBuf;

use thiserror::Error;

use crate::jar::core::ClassFormatError;
use crate::jar::modification::ManifestError;
use crate::mapping::MappingError;

/// Errors that can abort a migration run.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The run was configured incorrectly; nothing has been touched yet.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The mapping table could not be built.
    #[error("invalid mapping table: {0}")]
    Mapping(#[from] MappingError),

    /// An artifact could not be parsed in its own format.
    #[error("malformed input {name}: {reason}")]
    InputFormat {
        /// Path or archive entry name of the offending artifact.
        name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A class file failed to parse.
    #[error("malformed class file {name}")]
    ClassFormat {
        /// Path or archive entry name of the class file.
        name: String,
        /// The underlying parse failure.
        #[source]
        source: ClassFormatError,
    },

    /// A JAR manifest failed to parse.
    #[error("malformed manifest in {archive}")]
    Manifest {
        /// The archive holding the manifest.
        archive: String,
        /// The underlying parse failure.
        #[source]
        source: ManifestError,
    },

    /// The ZIP container was corrupt or could not be written.
    #[error("archive error in {archive}: {source}")]
    Archive {
        /// The archive being processed.
        archive: String,
        /// The underlying ZIP failure.
        #[source]
        source: zip::result::ZipError,
    },

    /// A filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The path being read or written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The run was driven in the wrong order.
    #[error(transparent)]
    IllegalState(#[from] IllegalState),
}

impl MigrationError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MigrationError::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a ZIP error with the archive it concerns.
    pub fn archive(archive: impl Into<String>, source: zip::result::ZipError) -> Self {
        MigrationError::Archive {
            archive: archive.into(),
            source,
        }
    }

    /// `true` for errors raised before any artifact was read.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            MigrationError::Configuration(_) | MigrationError::Mapping(_)
        )
    }
}

/// Programming errors in how a [`Migration`](crate::Migration) is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IllegalState {
    /// Conversion status was queried before `execute` succeeded.
    #[error("Migration has not completed")]
    NotCompleted,

    /// `execute` was called on a run that already completed.
    #[error("Migration has already completed")]
    AlreadyCompleted,
}

/// Result type alias using [`MigrationError`].
pub type Result<T> = std::result::Result<T, MigrationError>;
