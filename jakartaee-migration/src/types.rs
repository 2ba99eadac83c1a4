use strum_macros::Display;

/// What a migration source turned out to be after sniffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ArtifactKind {
    Directory,
    /// A JAR/WAR/EAR/ZIP container.
    Archive,
    ClassBinary,
    /// A stand-alone `MANIFEST.MF`.
    Manifest,
    SourceText,
    /// Copied without inspection.
    Passthrough,
}

#[derive(Debug)]
pub struct MigrationEvent {
    pub stage: Stage,
    pub progress: StageProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Scanning,
    Converting,
    RepairingMetadata,
    Writing,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Scanning => "Scanning",
            Stage::Converting => "Converting",
            Stage::RepairingMetadata => "Repairing Metadata",
            Stage::Writing => "Writing",
            Stage::Done => "Done",
        }
    }
}

impl From<Stage> for MigrationEvent {
    fn from(value: Stage) -> Self {
        MigrationEvent {
            stage: value,
            progress: StageProgress::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageProgress {
    Unknown,
    Count { done: usize, total: usize },
    Done,
}

impl MigrationEvent {
    pub fn converting(done: usize, total: usize) -> Self {
        MigrationEvent {
            stage: Stage::Converting,
            progress: StageProgress::Count { done, total },
        }
    }

    pub fn done() -> Self {
        MigrationEvent {
            stage: Stage::Done,
            progress: StageProgress::Done,
        }
    }
}
