use std::{fs, path::PathBuf, str::FromStr};

use anyhow::Context;
use clap::{error::ErrorKind, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use strum::IntoEnumIterator;
use tracing::info;
use tracing_subscriber::EnvFilter;

use jakartaee_migration::{
    MappingRule, MappingTable, Migration, MigrationEvent, Profile, Stage, StageProgress,
};

const EXIT_USAGE: i32 = 1;
const EXIT_FAILURE: i32 = 2;

/// Migrate javax.* references in sources, classes and archives to jakarta.*
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Package set to migrate: TOMCAT (default) or EE
    #[arg(long, default_value_t = Profile::Tomcat, value_parser = parse_profile)]
    profile: Profile,

    /// Buffer archives fully in memory instead of spooling to disk
    #[arg(long)]
    zip_in_memory: bool,

    /// Log level: TRACE, DEBUG/FINE, INFO, WARN/WARNING, ERROR/SEVERE
    #[arg(long, default_value = "INFO")]
    log_level: String,

    /// JSON mapping table used instead of the profile's rules
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Source file, directory or archive
    source: PathBuf,

    /// Destination; may equal the source
    destination: PathBuf,
}

fn main() {
    let args = match Args::try_parse_from(normalize_legacy_flags(std::env::args())) {
        Ok(args) => args,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => EXIT_USAGE,
            };
            // printing can only fail if stderr is gone
            let _ = err.print();
            std::process::exit(code);
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_directive(&args.log_level))),
        )
        .init();

    if let Err(err) = run(args) {
        eprintln!("Migration failed: {err:#}");
        std::process::exit(EXIT_FAILURE);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut migration = Migration::new();
    migration.set_source(&args.source);
    migration.set_destination(&args.destination);
    migration.set_profile(args.profile);
    migration.set_zip_in_memory(args.zip_in_memory);

    if let Some(rules) = &args.rules {
        let json = fs::read_to_string(rules)
            .with_context(|| format!("Failed to read mapping table {}", rules.display()))?;
        let table = MappingTable::from_json(&json)
            .with_context(|| format!("Invalid mapping table {}", rules.display()))?;
        let exclusions = table.rules().filter(MappingRule::is_exclusion).count();
        info!(
            "Loaded {} mapping rules ({exclusions} exclusions) from {}",
            table.len(),
            rules.display()
        );
        migration.set_mapping_table(table);
    }

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {msg:20} [{bar:30.cyan/blue}] {pos}/{len}")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );

    migration
        .execute_with_progress(|event| show_progress(&bar, &event))
        .with_context(|| {
            format!(
                "Failed to migrate {} to {}",
                args.source.display(),
                args.destination.display()
            )
        })?;
    bar.finish_and_clear();

    let converted = migration.has_converted()?;
    info!(
        "{} {}",
        args.destination.display(),
        if converted {
            "written with migrated content"
        } else {
            "needed no changes"
        }
    );
    Ok(())
}

fn show_progress(bar: &ProgressBar, event: &MigrationEvent) {
    bar.set_message(event.stage.as_str());
    match event.progress {
        StageProgress::Count { done, total } => {
            bar.set_length(total as u64);
            bar.set_position(done as u64);
        }
        StageProgress::Done if event.stage == Stage::Done => bar.finish_and_clear(),
        StageProgress::Done | StageProgress::Unknown => bar.tick(),
    }
}

fn parse_profile(value: &str) -> Result<Profile, String> {
    Profile::from_str(value).map_err(|_| {
        let known: Vec<String> = Profile::iter().map(|profile| profile.to_string()).collect();
        format!("unknown profile {value:?}, expected one of {}", known.join(", "))
    })
}

/// Accept the historical single-dash spellings alongside the clap ones.
fn normalize_legacy_flags(args: impl IntoIterator<Item = String>) -> Vec<String> {
    args.into_iter()
        .map(|arg| {
            if arg == "-zipInMemory" {
                return "--zip-in-memory".to_owned();
            }
            if let Some(value) = arg.strip_prefix("-profile=") {
                return format!("--profile={value}");
            }
            if let Some(value) = arg.strip_prefix("-logLevel=") {
                return format!("--log-level={value}");
            }
            arg
        })
        .collect()
}

/// Map a level name, including the java.util.logging ones, to a filter directive.
fn log_directive(level: &str) -> String {
    let level = match level.to_ascii_uppercase().as_str() {
        "FINEST" | "FINER" | "TRACE" | "ALL" => "trace",
        "FINE" | "DEBUG" | "CONFIG" => "debug",
        "WARNING" | "WARN" => "warn",
        "SEVERE" | "ERROR" => "error",
        "OFF" => "off",
        _ => "info",
    };
    level.to_owned()
}
