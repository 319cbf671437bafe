use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "smartreview", version, about = "SmartReview sample host")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record an app launch
    Launch,
    /// Show stored counters and the current decision
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Evaluate the inline block and print it
    Show,
    /// Press a block button
    Act {
        /// like, dislike, rate-now, rate-later or rate-never
        action: smartreview_core::ReviewUiAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("SMARTREVIEW_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Launch => commands::review::launch().await,
        Commands::Status { json } => commands::review::status(json).await,
        Commands::Show => commands::review::show().await,
        Commands::Act { action } => commands::review::act(action).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
