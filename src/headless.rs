//! Command-line runner
//!
//! ```text
//! store-sync compare <kind>
//! store-sync sync <kind> <production|staging> <key>...
//! store-sync list <kind> [status]
//! store-sync clear <kind>
//! ```
//!
//! `<kind>` is one of collections, products, pages, files. Credentials come
//! from the config file or the `STORE_SYNC_*` environment variables.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use crate::application::events::ChannelReporter;
use crate::application::state::AppState;
use crate::domain::comparison::RecordStatus;
use crate::domain::entities::{EntityKey, EntityKind};
use crate::domain::environment::Environment;
use crate::domain::errors::SyncEngineError;
use crate::domain::reports::{CompareReport, ProgressUpdate, SyncReport};
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::logging::{init_console_logging, init_logging_with_config};

#[derive(Debug, Parser)]
#[command(name = "store-sync", about = "Compare and sync Shopify production and staging", version)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: HeadlessCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum HeadlessCommand {
    /// Compare one entity kind across both stores and store the results
    Compare {
        #[arg(value_enum)]
        kind: KindArg,
    },
    /// Copy the given keys from the opposite store into the target
    Sync {
        #[arg(value_enum)]
        kind: KindArg,
        #[arg(value_enum)]
        target: EnvironmentArg,
        #[arg(required = true, num_args = 1..)]
        keys: Vec<EntityKey>,
    },
    /// Print stored comparisons, optionally filtered by status
    List {
        #[arg(value_enum)]
        kind: KindArg,
        #[arg(value_enum)]
        status: Option<StatusArg>,
    },
    /// Delete stored comparisons for one kind
    Clear {
        #[arg(value_enum)]
        kind: KindArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    #[value(alias = "collection")]
    Collections,
    #[value(alias = "product")]
    Products,
    #[value(alias = "page")]
    Pages,
    #[value(alias = "file")]
    Files,
}

impl From<KindArg> for EntityKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Collections => EntityKind::Collection,
            KindArg::Products => EntityKind::Product,
            KindArg::Pages => EntityKind::Page,
            KindArg::Files => EntityKind::File,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EnvironmentArg {
    Production,
    Staging,
}

impl From<EnvironmentArg> for Environment {
    fn from(environment: EnvironmentArg) -> Self {
        match environment {
            EnvironmentArg::Production => Environment::Production,
            EnvironmentArg::Staging => Environment::Staging,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum StatusArg {
    InSync,
    HasDifferences,
    MissingInProduction,
    MissingInStaging,
}

impl From<StatusArg> for RecordStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::InSync => RecordStatus::InSync,
            StatusArg::HasDifferences => RecordStatus::HasDifferences,
            StatusArg::MissingInProduction => RecordStatus::MissingInProduction,
            StatusArg::MissingInStaging => RecordStatus::MissingInStaging,
        }
    }
}

/// Parse the arguments after the binary name
pub fn parse_args(args: &[String]) -> Result<HeadlessCommand, clap::Error> {
    let argv = std::iter::once("store-sync").chain(args.iter().map(String::as_str));
    Cli::try_parse_from(argv).map(|cli| cli.command)
}

/// Spawn a task that turns progress updates into log lines
fn progress_logger() -> (ChannelReporter, tokio::task::JoinHandle<()>) {
    let (reporter, mut receiver) = ChannelReporter::new();
    let handle = tokio::spawn(async move {
        while let Some(update) = receiver.recv().await {
            match update {
                ProgressUpdate::Compare { kind, current, total } => {
                    info!("Comparing {}: {}/{}", kind.plural(), current, total);
                }
                ProgressUpdate::Sync {
                    kind,
                    target,
                    current,
                    total,
                } => info!("Syncing {} to {}: {}/{}", kind.plural(), target, current, total),
                ProgressUpdate::KeySynced { record, .. } => info!("Synced {}", record.key),
            }
        }
    });
    (reporter, handle)
}

fn print_compare_report(kind: EntityKind, report: &CompareReport) {
    println!(
        "{}: {} total, {} in sync, {} with differences, {} missing in production, {} missing in staging, {} pruned",
        kind.plural(),
        report.total,
        report.in_sync,
        report.with_differences,
        report.missing_in_production,
        report.missing_in_staging,
        report.pruned
    );
    for failure in &report.failures {
        println!("  failed {}: {}", failure.key, failure.message);
    }
}

fn print_sync_report(report: &SyncReport) {
    println!("{}", report.summary());
    for failure in &report.failed {
        println!("  failed {}: {}", failure.key, failure.message);
    }
}

/// Execute one command against the configured stores
pub async fn execute(command: HeadlessCommand) -> Result<()> {
    let config_manager = ConfigManager::new()?;
    let config = config_manager.load_effective_config().await?;
    let logging = config
        .log_directory()
        .and_then(|directory| init_logging_with_config(&config.logging, &directory));
    if let Err(e) = logging {
        init_console_logging().ok();
        warn!("File logging unavailable, logging to console only: {:#}", e);
    }
    let state = AppState::initialize(config_manager, config).await?;
    let service = state.service().await;

    match command {
        HeadlessCommand::Compare { kind } => {
            let kind = EntityKind::from(kind);
            let (reporter, logger) = progress_logger();
            let result = service.compare(kind, &reporter).await;
            drop(reporter);
            logger.await.ok();
            let report = result.with_context(|| format!("Compare of {} failed", kind.plural()))?;
            print_compare_report(kind, &report);
        }
        HeadlessCommand::Sync { kind, target, keys } => {
            let (kind, target) = (EntityKind::from(kind), Environment::from(target));
            let (reporter, logger) = progress_logger();
            let result = service.sync(kind, &keys, target, &reporter).await;
            drop(reporter);
            logger.await.ok();
            match result {
                Ok(report) => print_sync_report(&report),
                Err(SyncEngineError::SyncIncomplete(report)) => {
                    print_sync_report(&report);
                    bail!("{} of {} keys failed", report.failed.len(), report.total);
                }
                Err(e) => return Err(e).context("Sync failed"),
            }
        }
        HeadlessCommand::List { kind, status } => {
            let status = status.map(RecordStatus::from);
            let records = service.comparisons(kind.into()).await?;
            for record in records
                .iter()
                .filter(|record| status.is_none_or(|wanted| record.status() == wanted))
            {
                println!(
                    "{}\t{}\t{}\t{}",
                    record.key,
                    record.production_id.as_deref().unwrap_or("-"),
                    record.staging_id.as_deref().unwrap_or("-"),
                    record.differences
                );
            }
        }
        HeadlessCommand::Clear { kind } => {
            let kind = EntityKind::from(kind);
            service.clear(kind).await?;
            println!("Cleared {} comparisons", kind.plural());
        }
    }
    Ok(())
}

/// Entry point used by `main`: builds the runtime and runs the parsed command
///
/// Usage errors and `--help` are printed by clap, which exits the process.
pub fn run_from_args(args: &[String]) -> Result<()> {
    let command = parse_args(args).unwrap_or_else(|e| e.exit());
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(execute(command)).inspect_err(|e| warn!("{:#}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn parses_sync_with_keys() {
        let command = parse_args(&args(&["sync", "products", "staging", "tee", "hat"])).unwrap();
        assert_eq!(
            command,
            HeadlessCommand::Sync {
                kind: KindArg::Products,
                target: EnvironmentArg::Staging,
                keys: vec!["tee".into(), "hat".into()],
            }
        );
    }

    #[test]
    fn parses_list_with_status_filter() {
        let command = parse_args(&args(&["list", "file", "missing_in_staging"])).unwrap();
        let HeadlessCommand::List { kind, status } = command else {
            panic!("expected list, got {command:?}");
        };
        assert_eq!(EntityKind::from(kind), EntityKind::File);
        assert_eq!(status.map(RecordStatus::from), Some(RecordStatus::MissingInStaging));
    }

    #[test]
    fn help_flag_is_not_a_sync_key() {
        let err = parse_args(&args(&["sync", "pages", "staging", "--help"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);

        let err = parse_args(&args(&["sync", "pages", "staging", "about", "--force"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn extra_arguments_are_rejected() {
        let err = parse_args(&args(&["compare", "pages", "staging"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn empty_arguments_print_help() {
        let err = parse_args(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(&args(&["sync", "pages", "staging"])).is_err());
        assert!(parse_args(&args(&["compare", "orders"])).is_err());
        assert!(parse_args(&args(&["list", "pages", "stale"])).is_err());
        assert!(parse_args(&args(&["deploy"])).is_err());
    }
}
