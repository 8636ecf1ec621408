mod analyze_command;
mod bot;
mod config_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "paperbot", about = "Paperbot: search and summarize repository papers over WhatsApp")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery in ./ and ~/.config/paperbot/).
    #[arg(long, global = true, env = "PAPERBOT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to WhatsApp and answer commands (default when no subcommand is provided).
    Run,
    /// Load and validate the configuration, then print the effective settings.
    CheckConfig,
    /// Summarize a local PDF without the messaging transport.
    Analyze {
        /// PDF file to analyze.
        file: PathBuf,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    // Progress and summaries of `analyze` own stdout/stderr; logs go to stderr too.
    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "paperbot starting");

    match cli.command {
        None | Some(Commands::Run) => {
            let config = config_commands::load(cli.config.as_deref())?;
            bot::run(config).await
        },
        Some(Commands::CheckConfig) => config_commands::check(cli.config.as_deref()),
        Some(Commands::Analyze { file }) => {
            let config = config_commands::load(cli.config.as_deref())?;
            analyze_command::analyze_file(&config, &file).await
        },
    }
}
