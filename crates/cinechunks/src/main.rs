//! CineChunks - turn a movie into an episodic series

use clap::{Parser, Subcommand};

mod commands;

use commands::{init_command, split_command, tools_command};

/// CineChunks CLI
#[derive(Parser)]
#[command(name = "cinechunks")]
#[command(about = "Split movies into episodic series with subtitle-aligned timestamps")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the config file
    Init,
    /// Split a movie into episodes
    Split {
        /// Movie title
        #[arg(short, long)]
        movie: String,
        /// Desired number of episodes
        #[arg(short, long, conflicts_with = "episode_length")]
        episodes: Option<u32>,
        /// Desired episode length in minutes
        #[arg(short = 'l', long)]
        episode_length: Option<u32>,
        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// List the tools the subtitle server advertises
    Tools,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Split { verbose: true, .. }) {
        tracing_subscriber::fmt().with_env_filter("debug").init();
    } else {
        tracing_subscriber::fmt::init();
    }

    match cli.command {
        Commands::Init => {
            if let Err(e) = init_command().await {
                eprintln!("Init failed: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Split {
            movie,
            episodes,
            episode_length,
            verbose: _,
        } => {
            if let Err(e) = split_command(movie, episodes, episode_length).await {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
        Commands::Tools => {
            if let Err(e) = tools_command().await {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
    }
}
