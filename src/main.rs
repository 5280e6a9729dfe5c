// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug, error, info};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use sub2anki::app_config::{self, Config};
use sub2anki::app_controller::{self, Controller, PipelineOptions};
use sub2anki::providers::google::GoogleTranslate;
use sub2anki::translation::TranslationCache;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a deck from a subtitle file (default command)
    Build,

    /// Show the size of a translation cache
    CacheInfo,

    /// Generate shell completions for sub2anki
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct BuildArgs {
    /// Subtitle file (.srt) to turn into flashcards
    #[arg(long, value_name = "PATH", global = true)]
    srt_in: Option<PathBuf>,

    /// Stop before the subtitle with this zero-based index
    #[arg(long, value_name = "N", global = true)]
    stop_short: Option<usize>,

    /// Deck name shown in Anki
    #[arg(long, value_name = "NAME", global = true)]
    anki_deck_name: Option<String>,

    /// Explicit 32-bit deck id; derived from the deck name when omitted
    #[arg(
        long,
        value_name = "ID",
        global = true,
        value_parser = clap::value_parser!(u32).range(2..=i64::from(u32::MAX))
    )]
    anki_deck_guid: Option<u32>,

    /// Output package (.apkg)
    #[arg(long, value_name = "PATH", global = true)]
    anki_out: Option<PathBuf>,

    /// Translation cache database [default: <user data dir>/sub2anki/translations.db]
    #[arg(long, value_name = "PATH", global = true)]
    translations_cache: Option<PathBuf>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long, global = true)]
    target_language: Option<String>,

    /// Source language code; detected by the service when omitted
    #[arg(short, long, global = true)]
    source_language: Option<String>,

    /// Google Cloud Translation API key
    #[arg(long, env = "GOOGLE_TRANSLATE_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// OAuth access token, e.g. from `gcloud auth print-access-token`
    #[arg(long, env = "GOOGLE_TRANSLATE_ACCESS_TOKEN", hide_env_values = true, global = true)]
    access_token: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "sub2anki.json", global = true)]
    config: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Do not draw a progress bar
    #[arg(long, global = true)]
    no_progress: bool,
}

/// sub2anki - subtitle lines to translated Anki flashcards
///
/// Reads a subtitle file, translates every line (remembering translations
/// in a local cache) and writes an Anki package with one card per line.
#[derive(Parser, Debug)]
#[command(name = "sub2anki")]
#[command(version)]
#[command(about = "Turn a subtitle file into an Anki deck of translated flashcards")]
#[command(long_about = "sub2anki reads a subtitle file, translates each line with Google Cloud Translation and writes an Anki deck (.apkg) with the original line on the front and the translation on the back.

EXAMPLES:
    sub2anki --srt-in ep2.srt --anki-deck-name 'Therapy Ep. 2' --anki-out ep2.apkg
    sub2anki --srt-in ep2.srt --anki-deck-name Test --anki-out test.apkg --stop-short 10
    sub2anki cache-info --translations-cache ./translations.db
    sub2anki completions bash > sub2anki.bash

CONFIGURATION:
    Settings are read from sub2anki.json by default (see --config). Command
    line flags override the file.

AUTHENTICATION:
    Requests need either an API key (GOOGLE_TRANSLATE_API_KEY or --api-key)
    or an OAuth access token (GOOGLE_TRANSLATE_ACCESS_TOKEN or --access-token).
    With application-default credentials set up through gcloud, use:
        GOOGLE_TRANSLATE_ACCESS_TOKEN=$(gcloud auth print-access-token) sub2anki ...
    Set translation.quota_project in the config file when the token belongs
    to a user account.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    build: BuildArgs,
}

// @struct: Custom logger implementation; filtering follows log::max_level()
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_logger(&CustomLogger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and label for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, label) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, label, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Start at info; the configured level is applied once options are known
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();

    let result = match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "sub2anki", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::CacheInfo) => run_cache_info(&cli.build),
        Some(Commands::Build) | None => run_build(cli.build).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Clap usage error when a required flag is missing
fn required<T>(value: Option<T>, flag: &str) -> Result<T, clap::Error> {
    value.ok_or_else(|| {
        CommandLineOptions::command().error(
            ErrorKind::MissingRequiredArgument,
            format!("the following required argument was not provided: {}", flag),
        )
    })
}

/// Exit with status 2 when a required flag is missing
fn require<T>(value: Option<T>, flag: &str) -> T {
    required(value, flag).unwrap_or_else(|e| e.exit())
}

fn resolve_cache_path(args: &BuildArgs) -> Result<PathBuf> {
    args.translations_cache
        .clone()
        .or_else(TranslationCache::default_path)
        .ok_or_else(|| anyhow!("Could not determine a default cache location; pass --translations-cache"))
}

/// Load the config file and apply command line overrides
fn load_config(args: &BuildArgs) -> Result<Config> {
    let mut config = Config::load_or_default(&args.config)?;

    if let Some(target_lang) = &args.target_language {
        config.target_language = target_lang.clone();
    }

    if let Some(source_lang) = &args.source_language {
        config.source_language = Some(source_lang.clone());
    }

    if let Some(api_key) = &args.api_key {
        config.translation.api_key = api_key.clone();
    }

    if let Some(access_token) = &args.access_token {
        config.translation.access_token = access_token.clone();
    }

    if let Some(log_level) = &args.log_level {
        config.log_level = log_level.clone().into();
    }

    Ok(config)
}

async fn run_build(args: BuildArgs) -> Result<()> {
    // Apply a command line log level before anything else is logged
    if let Some(cmd_log_level) = &args.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let srt_in = require(args.srt_in.clone(), "--srt-in <PATH>");
    let deck_name = require(args.anki_deck_name.clone(), "--anki-deck-name <NAME>");
    let anki_out = require(args.anki_out.clone(), "--anki-out <PATH>");

    let config = load_config(&args)?;
    log::set_max_level(config.log_level.to_level_filter());
    config.validate().context("Configuration validation failed")?;

    let options = PipelineOptions {
        srt_in,
        stop_short: args.stop_short,
        deck_name,
        deck_id: args.anki_deck_guid,
        anki_out,
        translations_cache: resolve_cache_path(&args)?,
        show_progress: !args.no_progress,
    };
    info!(
        "Building deck '{}' from {} into {}",
        options.deck_name,
        options.srt_in.display(),
        options.anki_out.display()
    );
    debug!("Options: {:?}", options);

    let provider = GoogleTranslate::new(&config.translation).context("Failed to create translation client")?;
    let controller = Controller::new(config, Box::new(provider));
    let summary = controller.run(&options).await?;

    info!(
        "Wrote {} notes to {} (deck id {})",
        summary.notes_added,
        summary.output_path.display(),
        summary.deck_id
    );
    Ok(())
}

fn run_cache_info(args: &BuildArgs) -> Result<()> {
    if let Some(cmd_log_level) = &args.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let path = resolve_cache_path(args)?;
    let stats = app_controller::cache_info(&path)?;
    println!("{}: {}", path.display(), stats);
    Ok(())
}
