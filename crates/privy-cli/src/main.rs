//! Privy CLI - local-first, fact-checking terminal assistant
//!
//! One-shot prompts and an interactive chat over the same pipeline the HTTP
//! server uses.

mod confirm;
mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::Input;
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

use privy::{ChatMessage, SessionBoundary, Settings};

use confirm::PromptConfirm;
use render::Renderer;

#[derive(Parser)]
#[command(name = "privy")]
#[command(about = "Privy - a local-first, AI-powered terminal assistant", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.config/privy/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single prompt
    Run {
        /// The prompt, joined with spaces
        #[arg(required = true, trailing_var_arg = true)]
        prompt: Vec<String>,
    },

    /// Interactive chat; type 'exit' or 'quit' to end
    Chat,

    /// List registered tools
    Tools,

    /// Show resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Run { prompt } => cmd_run(&settings, prompt.join(" ")).await,
        Commands::Chat => cmd_chat(&settings).await,
        Commands::Tools => cmd_tools(&settings),
        Commands::Config => cmd_config(&settings, cli.config.as_deref()),
    }
}

// ============================================
// Command Implementations
// ============================================

fn session(settings: &Settings) -> Result<SessionBoundary> {
    let context = privy_adapters::build_context(settings, Arc::new(PromptConfirm))?;
    Ok(SessionBoundary::new(Arc::new(context)))
}

async fn cmd_run(settings: &Settings, prompt: String) -> Result<()> {
    let session = session(settings)?;
    println!("{}", "\n🤖 AI Response:".cyan());
    process(&session, prompt, Vec::new()).await?;
    println!();
    Ok(())
}

async fn cmd_chat(settings: &Settings) -> Result<()> {
    let session = session(settings)?;
    let mut history: Vec<ChatMessage> = Vec::new();

    println!("{}", "Entering chat mode. Type 'exit' or 'quit' to end.".yellow());

    loop {
        let line = tokio::task::spawn_blocking(|| {
            Input::<String>::new()
                .with_prompt("\n>".green().to_string())
                .allow_empty(true)
                .interact_text()
        })
        .await
        .context("Input task failed")?;

        let prompt = match line {
            Ok(line) => line.trim().to_string(),
            Err(_) => break,
        };
        if prompt.is_empty() {
            continue;
        }
        if matches!(prompt.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        println!("{}", "\n🤖 AI Response:".cyan());
        let answer = process(&session, prompt.clone(), history.clone()).await?;
        println!();

        if let Some(answer) = answer {
            history.push(ChatMessage::user(prompt));
            history.push(ChatMessage::assistant(answer));
        }
    }

    println!("{}", "Exiting chat.".yellow());
    Ok(())
}

/// Stream one run to the terminal; `None` when cancelled with Ctrl-C or
/// when the run ended in an error
async fn process(
    session: &SessionBoundary,
    prompt: String,
    history: Vec<ChatMessage>,
) -> Result<Option<String>> {
    let mut run = session.submit(prompt, history);
    let mut renderer = Renderer::stdout();

    loop {
        tokio::select! {
            event = run.next() => match event {
                Some(event) => renderer.render(&event).context("Failed to write output")?,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                run.cancel();
                println!("{}", "\n⏹️ Cancelled.".yellow());
                return Ok(None);
            }
        }
    }

    Ok(renderer.into_answer())
}

fn cmd_tools(settings: &Settings) -> Result<()> {
    let client = privy_adapters::http_client()?;
    let registry = privy_adapters::build_registry(settings, &client)?;

    println!("{}", "Tools:".bold());
    for descriptor in registry.all() {
        let badge = if descriptor.effect.requires_confirmation() {
            format!("[{}]", descriptor.effect).red()
        } else {
            format!("[{}]", descriptor.effect).dimmed()
        };
        println!(
            "  {} {} ({})",
            descriptor.name.cyan().bold(),
            badge,
            descriptor.input.parameter.dimmed()
        );
        println!("    {}", descriptor.description);
    }

    Ok(())
}

fn cmd_config(settings: &Settings, explicit: Option<&Path>) -> Result<()> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(Settings::default_path);

    println!("{}", "Configuration:".bold());
    match path {
        Some(path) if path.exists() => println!("  Path: {:?}", path),
        Some(path) => println!("  Path: {:?} {}", path, "(not found, using defaults)".dimmed()),
        None => println!("  Path: {}", "None".dimmed()),
    }
    println!("  Engine: {} at {}", settings.engine.model.cyan(), settings.engine.base_url);
    println!("  Cache: {:?}", settings.cache_dir());
    println!();
    print!("{}", settings.to_toml()?);

    Ok(())
}
