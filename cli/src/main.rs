use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use relay_core::{
    AgentError, AgentLoop, CancellationToken, Config, StopReason, ToolRegistry, config,
    providers, tools,
};
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "relay - let a chat model call local tools", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.relay/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the model, one message or interactively
    Chat {
        #[arg(short, long)]
        message: Option<String>,
    },
    /// List the tools the model can call
    Tools,
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay=info,relay_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => config::load_config_from(path),
        None => Config::load_or_default(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    let registry = Arc::new(
        ToolRegistry::from_tools(tools::builtin_tools()?).context("Failed to register tools")?,
    );

    match cli.command.unwrap_or(Commands::Chat { message: None }) {
        Commands::Tools => print_tools(&registry)?,
        Commands::Chat { message } => {
            let provider = providers::create_provider(&config)?;
            tracing::debug!(
                model = %config.model,
                tools = registry.len(),
                max_round_trips = config.max_round_trips,
                "Starting chat"
            );
            let mut agent = AgentLoop::from_config(Arc::from(provider), registry, &config);

            match message {
                Some(msg) => {
                    if !run_turn(&mut agent, &msg).await {
                        anyhow::bail!("Agent run failed");
                    }
                }
                None => repl(&mut agent).await?,
            }
        }
    }

    Ok(())
}

fn print_tools(registry: &ToolRegistry) -> Result<()> {
    println!("{}", style("Available tools:").yellow().bold());
    for descriptor in registry.all() {
        println!("- {}: {}", style(&descriptor.name).cyan(), descriptor.description);
        let schema = serde_json::to_string_pretty(&descriptor.to_json_schema())?;
        for line in schema.lines() {
            println!("    {}", style(line).dim());
        }
    }
    Ok(())
}

async fn repl(agent: &mut AgentLoop) -> Result<()> {
    let mut editor = rustyline::DefaultEditor::new()?;

    println!("{}", style("relay").yellow().bold());
    println!(
        "{} tools loaded. Type 'exit' or press Ctrl+D to quit, '/reset' to start over.\n",
        agent.tool_registry().len()
    );

    loop {
        let line = match editor.readline("User: ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "exit" {
            break;
        }
        editor.add_history_entry(input)?;

        if input == "/reset" {
            agent.reset();
            println!("{}\n", style("Conversation cleared.").dim());
            continue;
        }

        run_turn(agent, input).await;
        println!();
    }

    println!("{}", style("Goodbye!").dim());
    Ok(())
}

/// Runs one user message; Ctrl+C cancels it. Returns whether it succeeded.
async fn run_turn(agent: &mut AgentLoop, input: &str) -> bool {
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let outcome = agent.run_with_cancel(input, cancel).await;
    watcher.abort();

    match outcome {
        Ok(report) => {
            if report.stop == StopReason::RoundTripLimit {
                eprintln!("{}", style("Tool round-trip limit reached.").yellow());
            }
            println!("{} {}", style("Assistant:").green().bold(), report.answer);
            true
        }
        Err(AgentError::Cancelled) => {
            eprintln!("{}", style("Cancelled.").yellow());
            false
        }
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            false
        }
    }
}
