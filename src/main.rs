// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};
use std::io::Write;
use std::path::PathBuf;

use bookwai::app_config::{self, Config};
use bookwai::app_controller::{Controller, RunOutcome};

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
    /// Generate shell completions for bookwai
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// bookwai - book translation with chat-completion models
///
/// Translates EPUB and plain-text books paragraph by paragraph while keeping
/// their layout.
#[derive(Parser, Debug)]
#[command(name = "bookwai")]
#[command(version)]
#[command(about = "AI-powered book translation tool")]
#[command(long_about = "bookwai splits a book into token-budgeted batches, translates them with an OpenAI-compatible model and writes a translated copy.

EXAMPLES:
    bookwai novel.epub                          # Translate using default config
    bookwai -t French novel.epub                # Translate into French
    bookwai -m gpt-4 -o out/ notes.txt          # Use a specific model and output directory
    bookwai -e novel.epub                       # Only estimate the token consumption
    bookwai completions bash > bookwai.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in config/default.json by default. You can specify a
    different file with --config. If the file doesn't exist, a default one will be
    created automatically. The API key may also come from OPENAI_API_KEY.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Book to translate (.epub or .txt)
    #[arg(value_name = "BOOK")]
    book: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long = "config", default_value = "config/default.json")]
    config_path: PathBuf,

    /// Directory receiving the translated book
    #[arg(short, long = "out-dir", default_value = "translated")]
    output_dir: PathBuf,

    /// Target language, an ISO code or a description
    #[arg(short, long = "target-lang")]
    target_language: Option<String>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Only estimate the token consumption
    #[arg(short, long)]
    estimate: bool,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(LevelFilter::Trace)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI colour for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the config says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "bookwai", &mut std::io::stdout());
        return Ok(());
    }

    run_translate(cli).await
}

async fn run_translate(options: CommandLineOptions) -> Result<()> {
    if let Some(level) = &options.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)?;

    if let Some(target_language) = &options.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(model) = &options.model {
        config.openai.model = model.clone();
    }
    if let Some(level) = &options.log_level {
        config.log_level = level.clone().into();
    }

    config
        .validate(!options.estimate)
        .context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    let book = options
        .book
        .context("BOOK is required when no subcommand is specified")?;

    let controller = Controller::with_config(config)?;
    match controller.run(&book, &options.output_dir, options.estimate).await? {
        RunOutcome::Estimated { titles, content } => {
            info!(
                "{} requests, about {} prompt tokens",
                titles.batches + content.batches,
                titles.prompt_tokens + content.prompt_tokens
            );
        }
        RunOutcome::Translated { output, failed, .. } => {
            info!("Success: {:?} ({} failed batches)", output, failed);
        }
    }

    Ok(())
}
