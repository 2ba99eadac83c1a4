use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet, HashSet},
    io::{self, Cursor, Read, Seek, Write},
};

use tracing::{debug, info, warn};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

use crate::{
    error::{MigrationError, Result},
    jar::{
        analysis::{classify, EntryKind},
        io::spool::{Spool, SpoolSlot},
        modification::{
            rewrite_class, rewrite_names, Manifest, ManifestRepair, SignatureRecord,
        },
    },
    mapping::MappingTable,
    types::{MigrationEvent, Stage},
    ENGINE_VERSION,
};

/// Where converted entry payloads wait until the archive is reassembled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BufferMode {
    /// Keep converted payloads in memory.
    InMemory,
    /// Spool converted payloads to an anonymous temporary file.
    #[default]
    Spooled,
}

/// Migrates every entry of a ZIP container and repairs its metadata.
pub struct ArchiveMigrator<'t> {
    table: &'t MappingTable,
    mode: BufferMode,
}

enum Content {
    Original,
    Rewritten(Stashed),
    Dropped,
}

enum Stashed {
    Memory(Vec<u8>),
    Spooled(SpoolSlot),
}

struct Stash {
    spool: Option<Spool>,
}

impl Stash {
    fn new(mode: BufferMode) -> io::Result<Self> {
        let spool = match mode {
            BufferMode::InMemory => None,
            BufferMode::Spooled => Some(Spool::new()?),
        };
        Ok(Stash { spool })
    }

    fn put(&mut self, payload: Vec<u8>) -> io::Result<Stashed> {
        match self.spool.as_mut() {
            Some(spool) => Ok(Stashed::Spooled(spool.push(&payload)?)),
            None => Ok(Stashed::Memory(payload)),
        }
    }

    fn get<'s>(&mut self, stashed: &'s Stashed) -> io::Result<Cow<'s, [u8]>> {
        match stashed {
            Stashed::Memory(payload) => Ok(Cow::Borrowed(payload)),
            Stashed::Spooled(slot) => {
                let spool = self
                    .spool
                    .as_mut()
                    .ok_or_else(|| io::Error::other("spooled payload without a spool"))?;
                Ok(Cow::Owned(spool.read(*slot)?))
            }
        }
    }
}

struct PlannedEntry {
    index: usize,
    name: String,
    target: String,
    kind: EntryKind,
    compression: CompressionMethod,
    unix_mode: Option<u32>,
    content: Content,
}

impl PlannedEntry {
    fn options(&self) -> SimpleFileOptions {
        let method = if self.compression == CompressionMethod::Stored {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflated
        };
        let options = SimpleFileOptions::default().compression_method(method);
        match self.unix_mode {
            Some(mode) => options.unix_permissions(mode),
            None => options,
        }
    }
}

impl<'t> ArchiveMigrator<'t> {
    pub fn new(table: &'t MappingTable, mode: BufferMode) -> Self {
        ArchiveMigrator { table, mode }
    }

    /// Migrate the archive read from `source` into `sink`.
    ///
    /// Returns `false`, without writing anything to `sink`, when no entry,
    /// entry name or manifest attribute needed rewriting.
    pub fn migrate<R, W>(
        &self,
        label: &str,
        source: R,
        sink: W,
        report: &mut dyn FnMut(MigrationEvent),
    ) -> Result<bool>
    where
        R: Read + Seek,
        W: Write + Seek,
    {
        report(Stage::Scanning.into());
        let mut archive =
            ZipArchive::new(source).map_err(|err| MigrationError::archive(label, err))?;
        let mut stash = Stash::new(self.mode).map_err(|err| MigrationError::io(label, err))?;

        let total = archive.len();
        let mut plans: Vec<PlannedEntry> = Vec::with_capacity(total);
        let mut manifest: Option<(usize, Vec<u8>)> = None;
        let mut signatures = SignatureRecord::default();
        let mut targets = HashSet::new();

        for index in 0..total {
            let mut file = archive
                .by_index(index)
                .map_err(|err| MigrationError::archive(label, err))?;
            let name = file.name().to_owned();
            let compression = file.compression();
            let unix_mode = file.unix_mode();
            let entry_label = format!("{label}!/{name}");

            let mut payload = Vec::new();
            file.read_to_end(&mut payload)
                .map_err(|err| MigrationError::InputFormat {
                    name: entry_label.clone(),
                    reason: err.to_string(),
                })?;
            drop(file);

            let route = classify(&name, &payload, self.table);
            let mut content = match route.kind {
                EntryKind::Manifest => {
                    manifest = Some((plans.len(), payload));
                    Content::Original
                }
                EntryKind::Signature => {
                    signatures.add(name.as_str());
                    Content::Original
                }
                kind => match convert_payload(kind, &entry_label, &payload, self.table)? {
                    Some(converted) => {
                        debug!("converted {entry_label}");
                        let stashed = stash
                            .put(converted)
                            .map_err(|err| MigrationError::io(label, err))?;
                        Content::Rewritten(stashed)
                    }
                    None => Content::Original,
                },
            };

            let target = match route.rename_to {
                Some(target) => {
                    debug!("renaming {entry_label} to {target}");
                    target
                }
                None => name.clone(),
            };
            if !targets.insert(target.clone()) {
                if route.kind != EntryKind::Directory {
                    return Err(MigrationError::InputFormat {
                        name: label.to_owned(),
                        reason: format!("entry {target} occurs more than once after renaming"),
                    });
                }
                content = Content::Dropped;
            }

            plans.push(PlannedEntry {
                index,
                name,
                target,
                kind: route.kind,
                compression,
                unix_mode,
                content,
            });
            report(MigrationEvent::converting(index + 1, total));
        }

        report(Stage::RepairingMetadata.into());
        let (converted, repaired_manifest) =
            self.repair_manifest(label, &plans, manifest, &signatures)?;
        if !converted {
            debug!("{label}: nothing to migrate");
            return Ok(false);
        }

        if signatures.is_signed() {
            signatures.report_removal(label);
            for plan in plans
                .iter_mut()
                .filter(|plan| plan.kind == EntryKind::Signature)
            {
                plan.content = Content::Dropped;
            }
        }
        if let Some((position, bytes)) = repaired_manifest {
            if let Some(plan) = plans.get_mut(position) {
                plan.content = Content::Rewritten(Stashed::Memory(bytes));
            }
        }

        report(Stage::Writing.into());
        let mut writer = ZipWriter::new(sink);
        let mut rewritten = 0;
        for plan in &plans {
            match &plan.content {
                Content::Dropped => continue,
                Content::Original => {
                    let file = archive
                        .by_index_raw(plan.index)
                        .map_err(|err| MigrationError::archive(label, err))?;
                    let copied = if plan.target == plan.name {
                        writer.raw_copy_file(file)
                    } else {
                        writer.raw_copy_file_rename(file, plan.target.as_str())
                    };
                    copied.map_err(|err| MigrationError::archive(label, err))?;
                }
                Content::Rewritten(stashed) => {
                    let payload = stash
                        .get(stashed)
                        .map_err(|err| MigrationError::io(label, err))?;
                    writer
                        .start_file(plan.target.as_str(), plan.options())
                        .map_err(|err| MigrationError::archive(label, err))?;
                    writer
                        .write_all(&payload)
                        .map_err(|err| MigrationError::io(label, err))?;
                    rewritten += 1;
                }
            }
        }
        writer
            .finish()
            .map_err(|err| MigrationError::archive(label, err))?;

        info!("{label}: migrated ({rewritten} of {total} entries rewritten)");
        Ok(true)
    }

    /// Migrate an in-memory archive, as done for archives nested in archives.
    pub fn migrate_bytes(&self, label: &str, bytes: &[u8]) -> Result<Option<Vec<u8>>> {
        let mut out = Cursor::new(Vec::new());
        let mut ignore = |_: MigrationEvent| {};
        let converted = self.migrate(label, Cursor::new(bytes), &mut out, &mut ignore)?;
        Ok(converted.then(|| out.into_inner()))
    }

    /// Decide whether the archive was converted and produce the repaired manifest.
    fn repair_manifest(
        &self,
        label: &str,
        plans: &[PlannedEntry],
        manifest: Option<(usize, Vec<u8>)>,
        signatures: &SignatureRecord,
    ) -> Result<(bool, Option<(usize, Vec<u8>)>)> {
        let repair = ManifestRepair {
            changed: plans
                .iter()
                .filter(|plan| matches!(plan.content, Content::Rewritten(_)))
                .map(|plan| plan.name.as_str())
                .collect::<BTreeSet<_>>(),
            renamed: plans
                .iter()
                .filter(|plan| plan.target != plan.name)
                .map(|plan| (plan.name.as_str(), plan.target.as_str()))
                .collect::<BTreeMap<_, _>>(),
            strip_all_digests: signatures.is_signed(),
        };
        let entries_converted = !repair.changed.is_empty() || !repair.renamed.is_empty();

        let Some((position, bytes)) = manifest else {
            return Ok((entries_converted, None));
        };
        let mut parsed = match Manifest::parse(&bytes) {
            Ok(parsed) => parsed,
            Err(source) if entries_converted => {
                return Err(MigrationError::Manifest {
                    archive: label.to_owned(),
                    source,
                })
            }
            Err(err) => {
                warn!("{label}: leaving unreadable manifest alone: {err}");
                return Ok((false, None));
            }
        };

        let values_converted = parsed.rewrite_values(self.table);
        if !entries_converted && !values_converted {
            return Ok((false, None));
        }
        parsed.repair(&repair, ENGINE_VERSION);
        Ok((true, Some((position, parsed.to_bytes()))))
    }
}

/// Run the rewriter that matches `kind` over one payload.
pub(crate) fn convert_payload(
    kind: EntryKind,
    name: &str,
    payload: &[u8],
    table: &MappingTable,
) -> Result<Option<Vec<u8>>> {
    match kind {
        EntryKind::ClassBinary => {
            rewrite_class(payload, table).map_err(|source| MigrationError::ClassFormat {
                name: name.to_owned(),
                source,
            })
        }
        EntryKind::SourceText | EntryKind::ServiceRegistration => {
            Ok(rewrite_names(payload, table))
        }
        EntryKind::NestedArchive => {
            ArchiveMigrator::new(table, BufferMode::InMemory).migrate_bytes(name, payload)
        }
        EntryKind::Directory
        | EntryKind::Manifest
        | EntryKind::Signature
        | EntryKind::Passthrough => Ok(None),
    }
}
