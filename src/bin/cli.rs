//! CLI binary for codemend.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use codemend::modes::schema_description;
use codemend::response::recover_with_description;
use codemend::{AppConfig, RequestState, ResponseHandler, TaskMode, TaskOptions};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Codemend: recover structured fields from malformed LLM responses.
#[derive(Parser)]
#[command(name = "codemend", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Validate a model response for a task mode, repairing it if needed.
    Recover {
        /// Task mode the response was produced for.
        #[arg(short, long)]
        mode: TaskMode,

        /// Repair against this schema description instead of the mode's schema.
        #[arg(long)]
        schema: Option<String>,

        /// Read the response from a file instead of stdin.
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[command(flatten)]
        options: OptionFlags,
    },

    /// Print the response schema description for a task mode.
    Schema {
        /// Task mode.
        mode: TaskMode,

        #[command(flatten)]
        options: OptionFlags,
    },

    /// Extract the JSON value embedded in a response without repairing it.
    Extract {
        /// Read the response from a file instead of stdin.
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

/// Flags that change the response shape.
#[derive(Args)]
struct OptionFlags {
    /// Generator: expect several alternative snippets.
    #[arg(long)]
    multiple: bool,

    /// Generator/converter: expect an explanation field.
    #[arg(long)]
    explanation: bool,

    /// Expect a leading reasoning field.
    #[arg(long)]
    reasoning: bool,
}

impl OptionFlags {
    /// Flags set on the command line add to the configured defaults.
    fn resolve(&self, defaults: TaskOptions) -> TaskOptions {
        TaskOptions {
            multiple: self.multiple || defaults.multiple,
            include_explanation: self.explanation || defaults.include_explanation,
            include_reasoning: self.reasoning || defaults.include_reasoning,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // An explicit --config must exist; the default location is optional.
    let config = match cli.config {
        Some(ref path) => AppConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => {
            let path = AppConfig::default_config_path();
            AppConfig::load_or_default(&path)
                .with_context(|| format!("failed to load config from {}", path.display()))?
        }
    };

    // RUST_LOG wins over the configured filter.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    match cli.command {
        Command::Recover {
            mode,
            schema,
            input,
            options,
        } => {
            let options = options.resolve(config.defaults);
            run_recover(&config, mode, options, schema.as_deref(), input.as_deref())
        }
        Command::Schema { mode, options } => {
            println!("{}", schema_description(mode, &options.resolve(config.defaults)));
            Ok(())
        }
        Command::Extract { input } => {
            let raw = read_input(input.as_deref())?;
            let value = codemend_recover::extract(&raw)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
    }
}

fn run_recover(
    config: &AppConfig,
    mode: TaskMode,
    options: TaskOptions,
    schema: Option<&str>,
    input: Option<&Path>,
) -> anyhow::Result<()> {
    let raw = read_input(input)?;
    debug!(bytes = raw.len(), "read response");

    let mut state = RequestState::default();
    state.begin();

    let response = match schema {
        Some(description) => recover_with_description(&raw, description, config, &mut state)?,
        None => {
            let handler = ResponseHandler::new(mode, options, config.clone());
            debug!(mode = %handler.mode(), fields = handler.schema().len(), "handling response");
            handler.handle(&raw, &mut state)?
        }
    };

    if let Some(report) = &response.report {
        for (field, source) in &report.sources {
            info!(field = %field, ?source, "recovered field");
        }
    }

    println!("{}", serde_json::to_string_pretty(&response.fields)?);
    Ok(())
}

/// Read the whole response from `path`, or from stdin when absent.
fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read stdin")?;
            Ok(raw)
        }
    }
}
