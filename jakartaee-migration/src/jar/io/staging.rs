//! Output staging: everything is written to a temporary file next to the
//! destination and renamed over it only once the content is complete.

use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::{NamedTempFile, TempPath};

use crate::error::{MigrationError, Result};

/// The directory a destination is staged in, created if missing.
pub fn staging_dir(destination: &Path) -> Result<PathBuf> {
    let dir = destination
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(|err| MigrationError::io(dir, err))?;
    Ok(dir.to_path_buf())
}

/// Create a temporary file in `dir`.
pub fn stage_in(dir: &Path) -> Result<NamedTempFile> {
    NamedTempFile::new_in(dir).map_err(|err| MigrationError::io(dir, err))
}

pub fn stage_bytes(dir: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let mut staged = stage_in(dir)?;
    staged
        .write_all(bytes)
        .map_err(|err| MigrationError::io(staged.path(), err))?;
    Ok(staged)
}

/// Stage a verbatim copy of `source`.
pub fn stage_copy(dir: &Path, source: &Path) -> Result<NamedTempFile> {
    let mut staged = stage_in(dir)?;
    let mut input = File::open(source).map_err(|err| MigrationError::io(source, err))?;
    io::copy(&mut input, staged.as_file_mut())
        .map_err(|err| MigrationError::io(staged.path(), err))?;
    Ok(staged)
}

/// Atomically move a staged file into place, carrying over the source permissions.
pub fn commit(staged: NamedTempFile, source: &Path, destination: &Path) -> Result<()> {
    commit_path(staged.into_temp_path(), source, destination)
}

/// [`commit`] for a staged file whose handle is already closed.
pub fn commit_path(staged: TempPath, source: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        fs::create_dir_all(parent).map_err(|err| MigrationError::io(parent, err))?;
    }
    if let Ok(metadata) = fs::metadata(source) {
        fs::set_permissions(&staged, metadata.permissions())
            .map_err(|err| MigrationError::io(destination, err))?;
    }
    staged
        .persist(destination)
        .map_err(|err| MigrationError::io(destination, err.error))
}

/// Copy an unconverted file; a no-op when source and destination coincide.
pub fn copy_unchanged(source: &Path, destination: &Path) -> Result<()> {
    if same_file(source, destination) {
        return Ok(());
    }
    let staged = stage_copy(&staging_dir(destination)?, source)?;
    commit(staged, source, destination)
}

pub fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
