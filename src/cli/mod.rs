//! CLI interface for subpulse.

pub mod handlers;
pub mod output;

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};

use crate::config::AppConfig;
use crate::init::AppContext;
use handlers::scrape::ScrapeArgs;
use output::OutputMode;

/// subpulse - subreddit comment sentiment analysis
#[derive(Parser)]
#[command(name = "subpulse", version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: ./subpulse.toml, then the user config dir)
    #[arg(long, env = "SUBPULSE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    pub json: bool,

    /// Output as Markdown
    #[arg(long, global = true)]
    pub md: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start MCP server (stdio transport)
    Mcp,

    /// List hot posts of a subreddit with their comment counts
    Posts {
        /// Subreddit name, with or without r/
        subreddit: String,
    },

    /// Classify the comments of one post and show the sentiment distribution
    Analyze {
        /// Subreddit name, with or without r/
        subreddit: String,
        /// Post title (exact, case-insensitive, or closest match). Default: first post
        #[arg(long)]
        post: Option<String>,
        /// Also list every comment with its label
        #[arg(long)]
        comments: bool,
    },

    /// Scrape newest posts and comments of several subreddits to CSV
    Scrape {
        /// Subreddit to scrape (repeatable). Default: the configured list
        #[arg(long = "subreddit", short = 's')]
        subreddits: Vec<String>,
        /// Newest posts per subreddit
        #[arg(long)]
        limit: Option<usize>,
        /// Comments per post
        #[arg(long)]
        comments_per_post: Option<usize>,
        /// Output directory for the CSV files
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Label a comments CSV with a word-score lexicon (AFINN format)
    Label {
        /// Comments CSV with comment_id and body columns
        input: PathBuf,
        /// Lexicon file: word<TAB>score per line
        #[arg(long)]
        lexicon: PathBuf,
        /// Write comment_id,sentiment rows here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, elvish, powershell)
        shell: clap_complete::Shell,
    },
}

/// Execute a CLI command. `Mcp` is handled in `main`.
pub async fn execute(command: Commands, config_path: Option<&Path>, mode: OutputMode) -> anyhow::Result<()> {
    match command {
        Commands::Mcp => unreachable!("MCP handled in main"),

        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "subpulse", &mut std::io::stdout());
        }

        Commands::Label {
            input,
            lexicon,
            output,
        } => handlers::label::handle_label(&input, &lexicon, output.as_deref(), mode).await?,

        Commands::Scrape {
            subreddits,
            limit,
            comments_per_post,
            out_dir,
        } => {
            let config = AppConfig::load(config_path)?;
            let args = ScrapeArgs {
                subreddits,
                limit,
                comments_per_post,
                out_dir,
            };
            handlers::scrape::handle_scrape(&config, args, mode).await?
        }

        Commands::Posts { subreddit } => {
            let ctx = AppContext::new(config_path).await?;
            handlers::posts::handle_posts(&ctx, &subreddit, mode).await?
        }

        Commands::Analyze {
            subreddit,
            post,
            comments,
        } => {
            let ctx = AppContext::new(config_path).await?;
            handlers::analyze::handle_analyze(&ctx, &subreddit, post.as_deref(), comments, mode)
                .await?
        }
    }
    Ok(())
}
