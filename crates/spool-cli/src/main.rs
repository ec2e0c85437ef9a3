//! logspool - durable on-device log batch queue
//!
//! Command-line entry point: enqueue events, serve and drop sealed batches,
//! purge stale files, and inspect queue and configuration state.

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use spool_cli::commands::{self, WriteRequest};
use spool_cli::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use spool_cli::{CliError, ExitCode};
use spool_config::{default_data_root, load_config, ENV_DATA_DIR};
use spool_store::SpoolEngine;
use std::path::PathBuf;

/// Durable on-device queue that batches log events for upload
#[derive(Parser)]
#[command(name = "logspool")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Root directory holding the versioned queue directory
    #[arg(long, global = true, env = ENV_DATA_DIR)]
    data_dir: Option<PathBuf>,

    /// Path to a JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Diagnostic log level on stderr (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Diagnostic log format on stderr (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Enqueue one log event
    Write(WriteArgs),

    /// Print the oldest sealed batch
    Read(ReadArgs),

    /// Delete a batch by id
    Drop(DropArgs),

    /// Delete files older than the old-file threshold
    Purge,

    /// Show queue statistics
    Status,

    /// Configuration management
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct WriteArgs {
    /// Event message
    message: String,

    /// Event severity (trace, debug, info, warn, error, critical)
    #[arg(long, default_value = "info")]
    level: spool_log::LogLevel,

    /// Service name attached to the event
    #[arg(long)]
    service: Option<String>,

    /// Logger name attached to the event
    #[arg(long)]
    logger: Option<String>,

    /// Tag such as env:prod (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Custom attribute as key=value (repeatable)
    #[arg(long = "attr")]
    attributes: Vec<String>,
}

#[derive(Args, Debug)]
struct ReadArgs {
    /// Delete the batch after printing it
    #[arg(long)]
    drop: bool,
}

#[derive(Args, Debug)]
struct DropArgs {
    /// Batch id as printed by `read`
    id: String,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the resolved configuration and where it came from
    Show,

    /// Validate a config file (defaults to the resolved one)
    Validate {
        /// Config file to validate
        path: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(cli.global.log_level, cli.global.log_format);
    init_logging(&log_config);

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(e) => output_error(&e),
    };

    std::process::exit(exit_code.as_i32());
}

fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    let global = &cli.global;
    let output = match &cli.command {
        Commands::Config(args) => return run_config(global, args),
        Commands::Write(args) => commands::write_event(&open(global)?, &write_request(args)?)?,
        Commands::Read(args) => match commands::read_next(&open(global)?, args.drop)? {
            Some(output) => output,
            None => {
                print_json(&serde_json::json!({ "command": "read", "batch_id": null }))?;
                return Ok(ExitCode::Empty);
            }
        },
        Commands::Drop(args) => commands::drop_batch(&open(global)?, &args.id)?,
        Commands::Purge => commands::purge(&open(global)?)?,
        Commands::Status => commands::status(&open(global)?)?,
    };
    print_json(&output)?;
    Ok(ExitCode::Clean)
}

fn open(global: &GlobalOpts) -> Result<SpoolEngine, CliError> {
    let resolved = load_config(global.config.as_deref())?;
    commands::open_engine(&data_root(global), resolved.config)
}

fn run_config(global: &GlobalOpts, args: &ConfigArgs) -> Result<ExitCode, CliError> {
    let output = match &args.command {
        ConfigCommands::Show => {
            let resolved = load_config(global.config.as_deref())?;
            commands::config_show(&resolved, &data_root(global))?
        }
        ConfigCommands::Validate { path } => match path.as_deref().or(global.config.as_deref()) {
            Some(path) => commands::config_validate(path)?,
            None => {
                let resolved = load_config(None)?;
                match &resolved.path {
                    Some(path) => commands::config_validate(path)?,
                    None => serde_json::json!({
                        "command": "config validate",
                        "path": null,
                        "valid": true,
                    }),
                }
            }
        },
    };
    print_json(&output)?;
    Ok(ExitCode::Clean)
}

fn write_request(args: &WriteArgs) -> Result<WriteRequest, CliError> {
    let attributes = args
        .attributes
        .iter()
        .map(|raw| commands::parse_attribute(raw))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(WriteRequest {
        message: args.message.clone(),
        level: args.level,
        service: args.service.clone(),
        logger: args.logger.clone(),
        tags: args.tags.clone(),
        attributes,
    })
}

fn data_root(global: &GlobalOpts) -> PathBuf {
    global.data_dir.clone().unwrap_or_else(default_data_root)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn output_error(e: &CliError) -> ExitCode {
    let exit_code = e.exit_code();

    let response = serde_json::json!({
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "status": "error",
        "error": {
            "code": e.code(),
            "kind": exit_code.code_name(),
            "message": e.to_string(),
        }
    });
    match serde_json::to_string_pretty(&response) {
        Ok(text) => eprintln!("{}", text),
        Err(_) => eprintln!("error: {}", e),
    }
    exit_code
}
