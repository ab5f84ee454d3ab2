//! CLI parsing and orchestration. Merges flags with the config file, checks connectivity,
//! resolves the target, exports, and maintains the last-run marker. Maps errors to exit codes.

use crate::api::{ApiError, BookStackApi, BookStackClient};
use crate::config::{self, Config};
use crate::export::{BookExport, ExportConfig, ExportError, Exporter};
use crate::last_run::{self, LastRunError};
use crate::resolve::{resolve_book, resolve_shelf};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_DIRECTORY: &str = "downloads";

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("{0}")]
    Export(#[from] ExportError),

    #[error("{0}")]
    LastRun(#[from] LastRunError),

    #[error("Cannot prepare download directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) => 1,
            CliRunError::Api(_) | CliRunError::Export(ExportError::Api(_)) => 2,
            CliRunError::Export(ExportError::Io { .. })
            | CliRunError::LastRun(_)
            | CliRunError::Io { .. } => 3,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "bookstack-export")]
#[command(about = "Export BookStack shelves and books as PDF files")]
#[command(
    after_help = "Config file keys (url, token, secret, directory, shelf, book, split_book, dir_clear, modified_only, test, timeout_secs, user_agent) supply defaults. CLI flags override config."
)]
pub struct Args {
    /// Config file. Default search: ./bookstack-export.toml, then the user config dir.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Base URL of the BookStack instance.
    #[arg(short = 'u', long, help_heading = "Authentication")]
    pub url: Option<String>,

    /// API token id.
    #[arg(short = 'T', long, help_heading = "Authentication")]
    pub token: Option<String>,

    /// API token secret.
    #[arg(short = 'S', long, help_heading = "Authentication")]
    pub secret: Option<String>,

    /// Directory to download PDFs into. Default: downloads.
    #[arg(short = 'd', long, help_heading = "Download Settings")]
    pub directory: Option<PathBuf>,

    /// Slug of the shelf to export.
    #[arg(
        short = 's',
        long,
        conflicts_with = "book",
        help_heading = "Download Settings"
    )]
    pub shelf: Option<String>,

    /// Slug of the book to export.
    #[arg(short = 'b', long, help_heading = "Download Settings")]
    pub book: Option<String>,

    /// Write one PDF per chapter/page into a directory per book instead of one PDF per book.
    #[arg(long, help_heading = "Download Settings")]
    pub split_book: bool,

    /// Delete the download directory before exporting.
    #[arg(
        long,
        conflicts_with = "modified_only",
        help_heading = "Download Settings"
    )]
    pub dir_clear: bool,

    /// Only export books with content changed since the last run.
    #[arg(long, help_heading = "Download Settings")]
    pub modified_only: bool,

    /// Read everything and report what would be saved, but write no files.
    #[arg(long, help_heading = "Download Settings")]
    pub test: bool,

    /// Request timeout in seconds (overrides config; default none).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// HTTP User-Agent (overrides config).
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Only print warnings and errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug logging and the full error cause chain.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,
}

impl Args {
    /// Default log level for this invocation.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

/// What to export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Shelf(String),
    Book(String),
}

/// Effective settings after merging CLI flags over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub url: String,
    pub token: String,
    pub secret: String,
    pub directory: PathBuf,
    pub target: Target,
    pub split_book: bool,
    pub dir_clear: bool,
    pub modified_only: bool,
    pub test: bool,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

impl Settings {
    pub fn resolve(args: &Args, config: Option<Config>) -> Result<Settings, CliRunError> {
        let config = config.unwrap_or_default();

        let url = required(args.url.clone().or(config.url), "--url")?;
        let token = required(args.token.clone().or(config.token), "--token")?;
        let secret = required(args.secret.clone().or(config.secret), "--secret")?;

        let target = match (&args.shelf, &args.book) {
            (Some(s), _) => Target::Shelf(s.clone()),
            (None, Some(b)) => Target::Book(b.clone()),
            (None, None) => match (config.shelf, config.book) {
                (Some(s), None) => Target::Shelf(s),
                (None, Some(b)) => Target::Book(b),
                (Some(_), Some(_)) => {
                    return Err(CliRunError::InvalidInput(
                        "Config sets both shelf and book; choose one, or pass --shelf or --book."
                            .to_string(),
                    ))
                }
                (None, None) => {
                    return Err(CliRunError::InvalidInput(
                        "Missing export target: pass --shelf <slug> or --book <slug>.".to_string(),
                    ))
                }
            },
        };

        let dir_clear = args.dir_clear || config.dir_clear.unwrap_or(false);
        let modified_only = args.modified_only || config.modified_only.unwrap_or(false);
        if dir_clear && modified_only {
            return Err(CliRunError::InvalidInput(
                "--dir-clear cannot be combined with --modified-only.".to_string(),
            ));
        }

        Ok(Settings {
            url,
            token,
            secret,
            directory: args
                .directory
                .clone()
                .or(config.directory)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DIRECTORY)),
            target,
            split_book: args.split_book || config.split_book.unwrap_or(false),
            dir_clear,
            modified_only,
            test: args.test || config.test.unwrap_or(false),
            timeout_secs: args.timeout.or(config.timeout_secs),
            user_agent: args.user_agent.clone().or(config.user_agent),
        })
    }
}

fn required(value: Option<String>, flag: &str) -> Result<String, CliRunError> {
    value.filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        CliRunError::InvalidInput(format!(
            "Missing required {}: pass it on the command line or set it in the config file.",
            flag
        ))
    })
}

/// Result of a run that did not hit a hard failure.
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Target resolved, had something to export, and files were written.
    pub success: bool,
    pub exports: Vec<BookExport>,
    /// Instant stored in the last-run marker, when it was advanced.
    pub marker: Option<DateTime<Utc>>,
}

/// Entry point for the CLI. Loads config, builds the HTTP client, and runs the export.
pub fn run(args: &Args) -> Result<RunOutcome, CliRunError> {
    let config = config::load_config(args.config.as_deref()).map_err(CliRunError::InvalidInput)?;
    let settings = Settings::resolve(args, config)?;

    let mut builder = BookStackClient::builder(&settings.url, &settings.token, &settings.secret);
    if let Some(secs) = settings.timeout_secs {
        builder = builder.timeout_secs(secs);
    }
    if let Some(ua) = &settings.user_agent {
        builder = builder.user_agent(ua.clone());
    }
    let mut client = builder.build().map_err(|e| match e {
        ApiError::InvalidUrl { input, reason } => CliRunError::InvalidInput(format!(
            "Expected a BookStack base URL, e.g. https://wiki.example.com. Invalid: {}: {}",
            input, reason
        )),
        other => CliRunError::Api(other),
    })?;

    execute(&settings, &mut client)
}

/// Run one export against `api` with already-merged settings.
pub fn execute(settings: &Settings, api: &mut dyn BookStackApi) -> Result<RunOutcome, CliRunError> {
    let dir = &settings.directory;

    if settings.dir_clear && !settings.test {
        tracing::info!("Clearing {} before export", dir.display());
        if dir.exists() {
            std::fs::remove_dir_all(dir).map_err(|e| CliRunError::Io {
                path: dir.clone(),
                source: e,
            })?;
        }
    }
    if !settings.test {
        std::fs::create_dir_all(dir).map_err(|e| CliRunError::Io {
            path: dir.clone(),
            source: e,
        })?;
    }

    print_system_info(api, settings.test)?;

    let since = if settings.modified_only {
        let since = last_run::read_last_run(dir)?;
        if since == DateTime::<Utc>::MIN_UTC {
            tracing::info!("No previous run recorded, downloading everything");
        } else {
            tracing::info!("Downloading information modified since {}", since);
        }
        Some(since)
    } else {
        None
    };

    let book_ids = match &settings.target {
        Target::Shelf(slug) => match resolve_shelf(api, slug)? {
            Some(shelf) if !shelf.books.is_empty() => {
                tracing::info!("{} has {} books", shelf.name, shelf.books.len());
                Some(shelf.books.iter().map(|b| b.id).collect::<Vec<_>>())
            }
            Some(shelf) => {
                tracing::warn!("{} does not have books to export", shelf.name);
                None
            }
            None => None,
        },
        Target::Book(slug) => resolve_book(api, slug)?.map(|b| vec![b.id]),
    };

    let mut outcome = RunOutcome::default();
    let success = match book_ids {
        Some(ids) => {
            let mut exporter = Exporter::new(
                api,
                ExportConfig {
                    download_dir: dir.clone(),
                    test_mode: settings.test,
                    split_book: settings.split_book,
                },
            );
            for id in ids {
                outcome.exports.push(exporter.export_book(id, since)?);
            }
            // Test mode never counts as a completed download.
            !settings.test
        }
        None => false,
    };

    if success && settings.modified_only {
        let now = last_run::write_last_run(dir)?;
        tracing::debug!(marker = %now, "advanced last-run marker");
        outcome.marker = Some(now);
    }
    outcome.success = success;
    Ok(outcome)
}

/// Connectivity and credentials check. Any failure aborts the run.
fn print_system_info(api: &mut dyn BookStackApi, test_mode: bool) -> Result<(), CliRunError> {
    let info = api.system_info()?;
    if test_mode {
        tracing::info!("Running in TEST MODE - no files will be modified");
    }
    tracing::info!("Connected to {} version {}", info.app_name, info.version);
    Ok(())
}
