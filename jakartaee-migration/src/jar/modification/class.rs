use tracing::debug;

use crate::jar::core::{ClassFile, ClassFormatError};
use crate::jar::modification::text::rewrite_names;
use crate::mapping::MappingTable;

/// Rewrite the `Utf8` constants of a class file.
///
/// Returns `Ok(None)` when no constant matched. On error nothing is
/// produced, so a class is never half rewritten.
pub fn rewrite_class(
    data: &[u8],
    table: &MappingTable,
) -> Result<Option<Vec<u8>>, ClassFormatError> {
    let class = ClassFile::parse(data)?;

    let mut changed = 0usize;
    let rewritten = class.write_with(|index, bytes| {
        let replaced = rewrite_names(bytes, table)?;
        debug!(
            "constant #{index}: {} -> {}",
            String::from_utf8_lossy(bytes),
            String::from_utf8_lossy(&replaced)
        );
        changed += 1;
        Some(replaced)
    })?;

    if changed == 0 {
        return Ok(None);
    }
    debug!("rewrote {changed} constant pool entries");
    Ok(Some(rewritten))
}
