use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use colloquy::context::transcript;
use colloquy::{ChatSession, Config, ConversationContext, Error, ModelClient, OllamaClient};

/// Colloquy - context-aware chat with a local language model
#[derive(Parser)]
#[command(name = "colloquy", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Resume from a saved transcript
    #[arg(short, long, env = "COLLOQUY_TRANSCRIPT")]
    transcript: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive text chat (default)
    Chat,
    /// Send a single message and print the reply
    Ask {
        /// Message text
        text: String,
        /// Save the exchange to this transcript afterwards
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Print the summary of a saved transcript
    Inspect {
        /// Transcript path
        path: PathBuf,
    },
    /// Check that the model server is reachable
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,colloquy=info",
        1 => "info,colloquy=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => chat(&config, cli.transcript.as_deref()).await,
        Command::Ask { text, save } => {
            ask(&config, cli.transcript.as_deref(), &text, save.as_deref()).await
        }
        Command::Inspect { path } => inspect(config, &path),
        Command::Check => check(&config).await,
    }
}

/// Build a context, resuming from `transcript` when given
///
/// A corrupt transcript is reported and the session starts empty.
fn open_context(
    config: &Config,
    transcript: Option<&Path>,
) -> anyhow::Result<ConversationContext> {
    let mut context = ConversationContext::new(config.context.clone());
    match colloquy::chat::preload(&mut context, transcript) {
        Ok(()) => {}
        Err(Error::CorruptTranscript(reason)) => {
            tracing::warn!(%reason, "transcript unusable, starting a fresh conversation");
            eprintln!("Transcript is corrupt ({reason}); starting a fresh conversation.");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(context)
}

/// Interactive text chat on stdin/stdout
async fn chat(config: &Config, transcript: Option<&Path>) -> anyhow::Result<()> {
    config.ensure_data_dir()?;
    let context = open_context(config, transcript)?;
    let model = OllamaClient::new(config.model.clone())?;

    println!("Colloquy text chat ({}). Type /help for commands.", config.model.name);
    if !context.is_empty() {
        println!("Resumed {} turns.", context.len());
    }

    let mut session = ChatSession::new(context, model, config.data_dir.clone());
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    session.run(stdin, &mut stdout).await?;

    println!("Goodbye!");
    Ok(())
}

/// One-shot message
async fn ask(
    config: &Config,
    transcript: Option<&Path>,
    text: &str,
    save: Option<&Path>,
) -> anyhow::Result<()> {
    let context = open_context(config, transcript)?;
    let model = OllamaClient::new(config.model.clone())?;
    let mut session = ChatSession::new(context, model, config.data_dir.clone());

    let reply = session.ask(text).await?;
    println!("{reply}");

    if let Some(path) = save {
        session.context().save(path)?;
    }
    Ok(())
}

/// Summarize a transcript without starting a session
fn inspect(config: Config, path: &Path) -> anyhow::Result<()> {
    let turns = transcript::load(path)?;
    let stored = turns.len();

    let mut context = ConversationContext::new(config.context);
    context.restore(turns);
    if stored > context.len() {
        println!("Note: {stored} turns stored, {} within the history bound.", context.len());
    }
    print!("{}", context.summary());
    Ok(())
}

/// Verify the model server answers and has the configured model
async fn check(config: &Config) -> anyhow::Result<()> {
    let client = OllamaClient::new(config.model.clone())?;
    let models = client.list_models().await?;

    println!("Model server reachable at {}", config.model.url);
    let tagged = format!("{}:", config.model.name);
    if models
        .iter()
        .any(|m| m == &config.model.name || m.starts_with(&tagged))
    {
        println!("Model {} is installed", config.model.name);
    } else {
        println!(
            "Model {} not found; installed: {}",
            config.model.name,
            if models.is_empty() {
                "none".to_string()
            } else {
                models.join(", ")
            }
        );
        anyhow::bail!("configured model is not installed");
    }

    // Round-trip a trivial prompt so timeouts show up here rather than mid-chat
    let reply = client.complete("Reply with the single word: ready").await?;
    tracing::debug!(%reply, "check reply");
    println!("Model responded");
    Ok(())
}
