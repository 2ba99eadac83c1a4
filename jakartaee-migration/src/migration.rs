//! The migration facade: configure a source and destination, run once, then
//! ask whether anything was converted.

use std::path::PathBuf;

use tracing::info;

use crate::{
    error::{IllegalState, MigrationError, Result},
    jar::io::{migrate_directory, migrate_file, BufferMode},
    mapping::MappingTable,
    profile::Profile,
    types::MigrationEvent,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum RunState {
    #[default]
    Pending,
    Completed {
        converted: bool,
    },
}

/// A single migration run.
///
/// ```no_run
/// use jakartaee_migration::{Migration, Profile};
///
/// let mut migration = Migration::new();
/// migration.set_source("webapp.war");
/// migration.set_destination("webapp-jakarta.war");
/// migration.set_profile(Profile::Ee);
/// migration.execute()?;
/// println!("converted: {}", migration.has_converted()?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default)]
pub struct Migration {
    source: Option<PathBuf>,
    destination: Option<PathBuf>,
    profile: Profile,
    zip_in_memory: bool,
    mapping_table: Option<MappingTable>,
    state: RunState,
}

impl Migration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_source(&mut self, source: impl Into<PathBuf>) {
        self.source = Some(source.into());
    }

    pub fn set_destination(&mut self, destination: impl Into<PathBuf>) {
        self.destination = Some(destination.into());
    }

    pub fn set_profile(&mut self, profile: Profile) {
        self.profile = profile;
    }

    /// Buffer whole archives in memory instead of spooling converted entries to disk.
    pub fn set_zip_in_memory(&mut self, zip_in_memory: bool) {
        self.zip_in_memory = zip_in_memory;
    }

    /// Use a custom table instead of the profile's built-in one.
    pub fn set_mapping_table(&mut self, table: MappingTable) {
        self.mapping_table = Some(table);
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn execute(&mut self) -> Result<()> {
        self.execute_with_progress(|_| {})
    }

    /// Run the migration, reporting stage events to `report_progress`.
    pub fn execute_with_progress(
        &mut self,
        mut report_progress: impl FnMut(MigrationEvent),
    ) -> Result<()> {
        if matches!(self.state, RunState::Completed { .. }) {
            return Err(IllegalState::AlreadyCompleted.into());
        }
        let (Some(source), Some(destination)) = (&self.source, &self.destination) else {
            return Err(MigrationError::Configuration(
                "both a source and a destination are required".to_owned(),
            ));
        };
        let metadata = source
            .metadata()
            .map_err(|err| MigrationError::io(source.as_path(), err))?;

        let table = match &self.mapping_table {
            Some(table) => table,
            None => self.profile.table(),
        };
        let mode = if self.zip_in_memory {
            BufferMode::InMemory
        } else {
            BufferMode::Spooled
        };

        info!(
            "Migrating {} to {} (profile {}{})",
            source.display(),
            destination.display(),
            self.profile,
            if self.mapping_table.is_some() {
                ", custom mapping table"
            } else {
                ""
            }
        );

        let converted = if metadata.is_dir() {
            migrate_directory(source, destination, table, mode, &mut report_progress)?
        } else {
            migrate_file(source, destination, table, mode, &mut report_progress)?
        };

        report_progress(MigrationEvent::done());
        info!(
            "Migration of {} finished, {}",
            source.display(),
            if converted {
                "content converted"
            } else {
                "nothing converted"
            }
        );
        self.state = RunState::Completed { converted };
        Ok(())
    }

    /// Whether the completed run rewrote anything.
    pub fn has_converted(&self) -> std::result::Result<bool, IllegalState> {
        match self.state {
            RunState::Pending => Err(IllegalState::NotCompleted),
            RunState::Completed { converted } => Ok(converted),
        }
    }
}
