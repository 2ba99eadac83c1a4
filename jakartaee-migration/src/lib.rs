//! Migrates Java artifacts from the `javax` namespace to `jakarta`.
//!
//! Sources, compiled classes, directories and JAR/WAR/EAR archives are
//! rewritten so that every reference to a package covered by the selected
//! [`Profile`] (or a custom [`MappingTable`]) points at its Jakarta EE
//! successor. Archives get their manifests and signatures repaired along the
//! way. [`Migration`] is the entry point; the [`jar`] module holds the engine.

pub mod error;
pub mod jar;
pub mod mapping;
pub mod migration;
pub mod profile;
pub mod types;

pub use error::{IllegalState, MigrationError, Result};
pub use mapping::{MappingError, MappingRule, MappingTable};
pub use migration::Migration;
pub use profile::Profile;
pub use types::{ArtifactKind, MigrationEvent, Stage, StageProgress};

/// Version token appended to migrated `Implementation-Version` values.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
