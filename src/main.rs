//! `think`: chain-of-thought MCP server and CLI.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use think::completion::{ChainOfThought, ChainOfThoughtTool};
use think::mcp::McpServer;
use think::streaming::stdout_sink;
use think::{Config, GroqBackend};

#[derive(Debug, Parser)]
#[command(name = "think", version, about = "Let a reasoning model think before you act")]
struct Cli {
    /// Config file (defaults to ~/.think/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the chain_of_thought tool over stdio (default)
    Serve,
    /// Think about a prompt once, streaming the reasoning to stdout
    Ask {
        /// What to think about
        prompt: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // stdout belongs to the protocol, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let backend = GroqBackend::from_config(&config.backend).context("creating backend")?;
    let chain = ChainOfThought::new(backend, config.cot);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let server = McpServer::new("think", env!("CARGO_PKG_VERSION"))
                .tool(ChainOfThoughtTool::new(chain));
            server.run_stdio().await?;
        }
        Command::Ask { prompt } => {
            let result = chain.run_streaming(&prompt, &mut stdout_sink()).await;
            println!();
            println!("{result}");
            if !result.is_success() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
