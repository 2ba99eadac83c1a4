use std::{
    fs::{self, File},
    io::{BufReader, Cursor, Read},
    path::Path,
};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::{
    error::{MigrationError, Result},
    jar::{
        analysis::sniff_file,
        io::{
            staging::{commit, copy_unchanged, stage_bytes, stage_in, staging_dir},
            writer::{ArchiveMigrator, BufferMode},
        },
        modification::{rewrite_class, rewrite_names, Manifest},
    },
    mapping::MappingTable,
    types::{ArtifactKind, MigrationEvent},
};

const HEAD_LEN: u64 = 8;

/// Migrate one stand-alone file into `destination`.
///
/// Unconverted files are copied as they are. `destination` may be the source
/// itself; the new content is staged and renamed over it.
pub fn migrate_file(
    source: &Path,
    destination: &Path,
    table: &MappingTable,
    mode: BufferMode,
    mut report_progress: impl FnMut(MigrationEvent),
) -> Result<bool> {
    let dir = staging_dir(destination)?;
    match convert_file(source, &dir, table, mode, &mut report_progress)? {
        Some(staged) => {
            commit(staged, source, destination)?;
            Ok(true)
        }
        None => {
            copy_unchanged(source, destination)?;
            Ok(false)
        }
    }
}

/// Convert one file into a temporary file inside `staging_dir`.
///
/// Returns `None` when nothing needed rewriting. Nothing outside
/// `staging_dir` is written either way.
pub(crate) fn convert_file(
    source: &Path,
    staging_dir: &Path,
    table: &MappingTable,
    mode: BufferMode,
    report_progress: &mut dyn FnMut(MigrationEvent),
) -> Result<Option<NamedTempFile>> {
    let head = read_head(source)?;
    let kind = sniff_file(source, &head);
    let label = source.display().to_string();
    debug!("{label}: {kind}");

    if kind == ArtifactKind::Archive {
        return convert_archive_file(source, staging_dir, table, mode, report_progress);
    }

    report_progress(MigrationEvent::converting(0, 1));
    let bytes = fs::read(source).map_err(|err| MigrationError::io(source, err))?;
    let converted = match kind {
        ArtifactKind::ClassBinary => {
            rewrite_class(&bytes, table).map_err(|source| MigrationError::ClassFormat {
                name: label.clone(),
                source,
            })?
        }
        ArtifactKind::Manifest => {
            let mut manifest =
                Manifest::parse(&bytes).map_err(|source| MigrationError::Manifest {
                    archive: label.clone(),
                    source,
                })?;
            manifest
                .rewrite_values(table)
                .then(|| manifest.to_bytes())
        }
        ArtifactKind::SourceText => rewrite_names(&bytes, table),
        ArtifactKind::Archive | ArtifactKind::Directory | ArtifactKind::Passthrough => None,
    };
    report_progress(MigrationEvent::converting(1, 1));

    match converted {
        Some(rewritten) => {
            debug!("{label}: rewritten");
            stage_bytes(staging_dir, &rewritten).map(Some)
        }
        None => Ok(None),
    }
}

fn convert_archive_file(
    source: &Path,
    staging_dir: &Path,
    table: &MappingTable,
    mode: BufferMode,
    report_progress: &mut dyn FnMut(MigrationEvent),
) -> Result<Option<NamedTempFile>> {
    let label = source.display().to_string();
    let migrator = ArchiveMigrator::new(table, mode);

    match mode {
        BufferMode::InMemory => {
            let bytes = fs::read(source).map_err(|err| MigrationError::io(source, err))?;
            let mut out = Cursor::new(Vec::new());
            let converted = migrator.migrate(
                &label,
                Cursor::new(bytes.as_slice()),
                &mut out,
                report_progress,
            )?;
            if !converted {
                return Ok(None);
            }
            stage_bytes(staging_dir, out.get_ref()).map(Some)
        }
        BufferMode::Spooled => {
            let input = File::open(source).map_err(|err| MigrationError::io(source, err))?;
            let mut staged = stage_in(staging_dir)?;
            let converted = migrator.migrate(
                &label,
                BufReader::new(input),
                staged.as_file_mut(),
                report_progress,
            )?;
            // an unconverted stage is dropped, removing the temporary file
            Ok(converted.then_some(staged))
        }
    }
}

fn read_head(source: &Path) -> Result<Vec<u8>> {
    let file = File::open(source).map_err(|err| MigrationError::io(source, err))?;
    let mut head = Vec::with_capacity(HEAD_LEN as usize);
    file.take(HEAD_LEN)
        .read_to_end(&mut head)
        .map_err(|err| MigrationError::io(source, err))?;
    Ok(head)
}
