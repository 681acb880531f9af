//! mcp-chat — terminal front end for the tool-calling chat loop.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use mcp_chat::config::{self, AppConfig};
use mcp_chat::inference::Role;
use mcp_chat::{ChatSession, ConversationEvent};

/// Chat with a language model that can call the function backend's tools.
#[derive(Parser)]
#[command(name = "mcp-chat")]
#[command(about = "Tool-calling chat over a remote function backend", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (overrides $MCP_CHAT_CONFIG and the upward search for mcp-chat.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for agent.log (defaults to the platform data directory)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Subcommand (if not provided, starts the interactive chat)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat,

    /// Send one message and print the answer
    Ask {
        /// The message to send
        message: String,
    },

    /// Check whether the function backend is reachable
    Status,

    /// List the tools the function backend exposes
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = cli.log_dir.clone().unwrap_or_else(mcp_chat::data_dir);
    let log_path = mcp_chat::init_tracing(&log_dir, cli.log_json)
        .with_context(|| format!("failed to initialize logging in {}", log_dir.display()))?;

    let config = load_config(cli.config.as_deref())?;
    let mut session = ChatSession::from_config(&config).context("failed to create chat session")?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_repl(&mut session, &log_path).await,
        Commands::Ask { message } => {
            let outcome = session.send_message(&message).await;
            if let Some(answer) = session.messages().last() {
                println!("{}", answer.content());
            }
            if !outcome.is_success() {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Status => {
            let availability = session.check_availability().await;
            println!("{}", availability.message);
            if !availability.available {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Tools => {
            print_tools(&session).await;
            Ok(())
        }
    }
}

fn load_config(explicit: Option<&std::path::Path>) -> Result<AppConfig> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    match config::find_config_path(explicit, &cwd) {
        Ok(path) => {
            let loaded = config::load_config(&path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!(path = %path.display(), "config loaded");
            Ok(loaded)
        }
        Err(config::ConfigError::NotFound { .. }) => {
            tracing::warn!("no {} found, using defaults", config::CONFIG_FILE_NAME);
            Ok(AppConfig::default())
        }
        Err(e) => Err(e.into()),
    }
}

async fn run_repl(session: &mut ChatSession, log_path: &std::path::Path) -> Result<()> {
    let availability = session.check_availability().await;
    println!("mcp-chat {} (logs: {})", env!("CARGO_PKG_VERSION"), log_path.display());
    println!("Tool backend: {}", availability.message);
    println!("Commands: /tools /refresh /status /clear /quit");

    let printer = tokio::spawn(print_events(session.subscribe()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => session.clear(),
            "/status" => println!("{}", session.check_availability().await.message),
            "/tools" => print_tools(session).await,
            "/refresh" => {
                let tools = session.refresh_tools().await;
                println!("{} tools available", tools.len());
            }
            text => {
                let outcome = session.send_message(text).await;
                tracing::debug!(status = ?outcome.status, "turn finished");
            }
        }
    }

    printer.abort();
    Ok(())
}

/// Render conversation changes as they happen.
async fn print_events(mut rx: broadcast::Receiver<ConversationEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                tracing::debug!(version = event.version(), "conversation changed");
                match event {
                    ConversationEvent::Appended { message, .. } => match message.role() {
                        Role::Assistant => println!("assistant> {}", message.content()),
                        Role::Function => println!("  [tool {} returned]", message.name().unwrap_or("?")),
                        Role::User | Role::System => {}
                    },
                    ConversationEvent::Cleared { .. } => println!("(conversation cleared)"),
                    ConversationEvent::Removed { .. } | ConversationEvent::Inserted { .. } => {}
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "display fell behind conversation events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn print_tools(session: &ChatSession) {
    let tools = session.tools().await;
    if tools.is_empty() {
        println!("No tools available.");
        return;
    }
    for tool in tools {
        println!("- {}: {}", tool.name, tool.description);
    }
}
