mod command;
mod commands;
mod config;
mod diff;
mod github;
mod service;
mod suggestions;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

use config::{GitHubArgs, HandleArgs, Service};
use github::types::Reaction;

#[derive(Parser)]
#[command(name = "smarteditor-action")]
#[command(about = "Relay pull request comment commands to a text suggestion service")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Act on a trigger comment: review a file or commit its suggestions
    Handle(HandleArgs),

    /// Parse a comment body and print the command it contains as JSON
    Parse {
        /// Comment body
        #[arg(short, long, env = "COMMENT_BODY")]
        body: String,

        /// Service to parse for; detected from the body when omitted
        #[arg(short, long, value_enum)]
        service: Option<Service>,
    },

    /// Print the head branch of a pull request
    HeadRef {
        #[command(flatten)]
        github: GitHubArgs,

        /// Pull request number
        #[arg(long, env = "PR_NUMBER")]
        pr_number: u64,
    },

    /// Add a reaction to a PR comment
    React {
        #[command(flatten)]
        github: GitHubArgs,

        /// Comment id
        #[arg(long, env = "COMMENT_ID")]
        comment_id: u64,

        /// Reaction content
        #[arg(long, value_enum, default_value = "eyes")]
        content: Reaction,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    // stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Handle(args) => {
            commands::handle::run(&args).await?;
        }
        Commands::Parse { body, service } => {
            commands::parse::run(&body, service)?;
        }
        Commands::HeadRef { github, pr_number } => {
            commands::head_ref::run(&github, pr_number).await?;
        }
        Commands::React {
            github,
            comment_id,
            content,
        } => {
            commands::react::run(&github, comment_id, content).await?;
        }
    }

    Ok(())
}
