use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use ratewatch::core::config::Condition;
use ratewatch::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Path to the rate cache file
    #[arg(long, global = true)]
    cache_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single check cycle (meant to be invoked by a scheduler)
    Check,
    /// Show the current monitor configuration
    Show,
    /// Validate and save the monitor configuration
    Set {
        /// Email address to notify
        #[arg(long)]
        email: String,

        /// Target interest rate in percent, 0 to 100
        #[arg(long)]
        target_rate: f64,

        /// When to notify: "gte"/"lte" or the full phrase
        #[arg(long)]
        condition: Condition,
    },
    /// Send a test email to verify delivery configuration
    TestEmail {
        /// Recipient address; defaults to the configured one
        recipient: Option<String>,
    },
}

impl From<Commands> for ratewatch::AppCommand {
    fn from(cmd: Commands) -> ratewatch::AppCommand {
        match cmd {
            Commands::Check => ratewatch::AppCommand::Check,
            Commands::Show => ratewatch::AppCommand::Show,
            Commands::Set {
                email,
                target_rate,
                condition,
            } => ratewatch::AppCommand::Set {
                email,
                target_rate,
                condition,
            },
            Commands::TestEmail { recipient } => ratewatch::AppCommand::TestEmail { recipient },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let settings =
        ratewatch::Settings::from_env(cli.config_path.as_deref(), cli.cache_path.as_deref())?;
    let result = ratewatch::run_command(command.into(), settings).await;

    if let Err(e) = &result {
        tracing::error!(error = %e, "Command failed");
    }
    result
}
