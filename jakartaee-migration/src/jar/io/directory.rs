use std::{
    collections::HashSet,
    fs,
    path::{Component, Path, PathBuf},
};

use tempfile::{TempDir, TempPath};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::{
    error::{MigrationError, Result},
    jar::{
        analysis::renamed_entry,
        io::{
            file::convert_file,
            staging::{commit_path, same_file, stage_copy},
            writer::BufferMode,
        },
    },
    mapping::MappingTable,
    types::{MigrationEvent, Stage},
};

const STAGING_PREFIX: &str = ".jakartaee-migration-";

/// Migrate every file below `source` into the same layout under `destination`.
///
/// Paths are renamed the way archive entries are. Every file is converted
/// into a staging area first; the destination is only written once the whole
/// tree converted. When migrating in place, renamed originals are removed
/// after that, and directories emptied that way are left behind.
pub fn migrate_directory(
    source: &Path,
    destination: &Path,
    table: &MappingTable,
    mode: BufferMode,
    mut report_progress: impl FnMut(MigrationEvent),
) -> Result<bool> {
    report_progress(Stage::Scanning.into());

    let created = !destination.exists();
    fs::create_dir_all(destination).map_err(|err| MigrationError::io(destination, err))?;
    let planned = DirectoryPlan::convert(source, destination, table, mode, &mut report_progress);
    let plan = match planned {
        Ok(plan) => plan,
        Err(err) => {
            if created {
                // fails harmlessly if anything else ended up in there
                let _ = fs::remove_dir(destination);
            }
            return Err(err);
        }
    };

    report_progress(Stage::Writing.into());
    let files = plan.files.len();
    let converted = plan.commit()?;

    info!(
        "{}: migrated {files} files{}",
        source.display(),
        if converted { "" } else { ", nothing to convert" }
    );
    Ok(converted)
}

/// A file of the tree, converted but not yet in place.
struct PlannedFile {
    source: PathBuf,
    target: PathBuf,
    renamed: bool,
    /// `None` when the file stays where it is, untouched.
    staged: Option<TempPath>,
}

struct DirectoryPlan {
    dirs: Vec<PathBuf>,
    files: Vec<PlannedFile>,
    in_place: bool,
    converted: bool,
    // declared last so staged files are released before their directory
    staging: TempDir,
}

impl DirectoryPlan {
    fn convert(
        source: &Path,
        destination: &Path,
        table: &MappingTable,
        mode: BufferMode,
        report_progress: &mut dyn FnMut(MigrationEvent),
    ) -> Result<Self> {
        let source_root = source
            .canonicalize()
            .map_err(|err| MigrationError::io(source, err))?;
        let destination_root = destination
            .canonicalize()
            .map_err(|err| MigrationError::io(destination, err))?;
        let in_place = same_file(&source_root, &destination_root);
        let nested = !in_place && destination_root.starts_with(&source_root);

        let entries = WalkDir::new(&source_root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !nested || !entry.path().starts_with(&destination_root))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|err| {
                let path = err.path().unwrap_or(source).to_path_buf();
                MigrationError::io(path, err.into())
            })?;

        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&destination_root)
            .map_err(|err| MigrationError::io(&destination_root, err))?;

        let total = entries.len();
        let mut plan = DirectoryPlan {
            dirs: Vec::new(),
            files: Vec::with_capacity(total),
            in_place,
            converted: false,
            staging,
        };
        let mut targets = HashSet::new();

        for (done, entry) in entries.iter().enumerate() {
            let Ok(relative) = entry.path().strip_prefix(&source_root) else {
                continue;
            };
            let name = entry_name(relative);

            if entry.file_type().is_dir() {
                let target = renamed_entry(&format!("{name}/"), table)
                    .map(|renamed| renamed.trim_end_matches('/').to_owned());
                plan.converted |= target.is_some();
                let dir = destination_root.join(target.as_deref().unwrap_or(&name));
                plan.dirs.push(dir);
                continue;
            }

            let renamed = renamed_entry(&name, table);
            let target = renamed.clone().unwrap_or_else(|| name.clone());
            if !targets.insert(target.clone()) {
                return Err(MigrationError::InputFormat {
                    name: source.display().to_string(),
                    reason: format!("file {target} occurs more than once after renaming"),
                });
            }

            let mut ignore = |_: MigrationEvent| {};
            let staged =
                convert_file(entry.path(), plan.staging.path(), table, mode, &mut ignore)?;
            if staged.is_some() {
                debug!("converted {name}");
                plan.converted = true;
            }
            if let Some(renamed) = &renamed {
                debug!("renaming {name} to {renamed}");
                plan.converted = true;
            }
            let staged = match staged {
                Some(staged) => Some(staged),
                None if in_place && renamed.is_none() => None,
                None => Some(stage_copy(plan.staging.path(), entry.path())?),
            };

            plan.files.push(PlannedFile {
                source: entry.path().to_path_buf(),
                target: destination_root.join(&target),
                renamed: renamed.is_some(),
                staged: staged.map(|staged| staged.into_temp_path()),
            });
            report_progress(MigrationEvent::converting(done + 1, total));
        }
        Ok(plan)
    }

    /// Move every staged file into place, then drop renamed originals.
    fn commit(self) -> Result<bool> {
        for dir in &self.dirs {
            fs::create_dir_all(dir).map_err(|err| MigrationError::io(dir, err))?;
        }

        let mut originals = Vec::new();
        for file in self.files {
            if let Some(staged) = file.staged {
                commit_path(staged, &file.source, &file.target)?;
            }
            if self.in_place && file.renamed {
                originals.push(file.source);
            }
        }
        for original in originals {
            fs::remove_file(&original).map_err(|err| MigrationError::io(original, err))?;
        }
        Ok(self.converted)
    }
}

/// Relative path with `/` separators, the way archive entries are named.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
