//! subpulse - sentiment of subreddit comment threads
//!
//! Usage:
//!   subpulse mcp                          Start MCP server on stdio
//!   subpulse posts <subreddit>            List hot posts with comment counts
//!   subpulse analyze <subreddit> --post   Sentiment distribution for one post
//!   subpulse scrape -s <subreddit>        Bulk scrape newest posts to CSV
//!   subpulse label <csv> --lexicon <f>    Lexicon-based labeling of a CSV
//!   subpulse --help                       Show all commands

use anyhow::Result;
use clap::Parser;

use subpulse::cli::output::OutputMode;
use subpulse::cli::{Cli, Commands};
use subpulse::init::AppContext;
use subpulse::mcp::server::run_mcp_server;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Tracing to stderr (safe for MCP stdio transport)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("subpulse=info".parse()?),
        )
        .init();

    let mode = OutputMode::from_flags(cli.json, cli.md);

    match cli.command {
        Commands::Mcp => {
            let ctx = AppContext::new(cli.config.as_deref()).await?;
            run_mcp_server(ctx).await?;
        }
        cmd => subpulse::cli::execute(cmd, cli.config.as_deref(), mode).await?,
    }

    Ok(())
}
