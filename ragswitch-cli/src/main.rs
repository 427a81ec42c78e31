use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use ragswitch_cli::logging::init_logging;
use ragswitch_cli::{App, Settings, shell};
use ragswitch_model::LlmProvider;
use ragswitch_model::ollama::OllamaChatProvider;

#[derive(Parser, Debug)]
#[command(
    name = "ragswitch",
    version,
    about = "Chat with your documents using a cloud or a local language model"
)]
struct Cli {
    /// Secrets file (TOML) that overrides the environment
    #[arg(long, global = true, value_name = "PATH")]
    secrets: Option<PathBuf>,

    /// Use the fast CPU profile (smaller chunks, shorter answers)
    #[arg(long, global = true)]
    fast: bool,

    /// Start with this provider: cloud/openai or local/ollama
    #[arg(long, global = true, value_name = "NAME")]
    provider: Option<String>,

    /// More log output (-v, -vv)
    #[arg(short = 'v', long = "debug", action = ArgAction::Count, global = true)]
    debug: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the interactive chat (default)
    Chat,
    /// Answer one question and exit
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
        /// Also print retrieved chunks and the full prompt
        #[arg(long)]
        verbose: bool,
    },
    /// Rebuild the document index
    Ingest {
        /// Drop existing chunks first
        #[arg(long)]
        reset: bool,
    },
    /// List models installed in Ollama
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let mut settings = Settings::load(cli.secrets.as_deref())?;
    if cli.fast {
        settings.apply_fast_profile();
    }
    if let Some(name) = &cli.provider {
        settings.llm_provider = name.parse::<LlmProvider>()?;
    }
    settings.validate()?;

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => {
            let mut app = App::build(settings, false).await?;
            app.ensure_indexed().await?;
            shell::print_info(&app);
            println!();
            shell::run(&mut app).await
        }
        Command::Ask { question, verbose } => {
            let app = App::build(settings, false).await?;
            app.ensure_indexed().await?;
            let question = question.join(" ");
            let reply = app.bot.chat(&question, verbose).await?;
            shell::print_reply(&question, &reply);
            Ok(())
        }
        Command::Ingest { reset } => {
            let app = App::build(settings, reset).await?;
            if !reset && app.bot.index().count().await? > 0 {
                println!("Index already populated; use --reset to rebuild it");
                return Ok(());
            }
            let (documents, chunks) = app.ingest().await?;
            println!("Indexed {documents} documents as {chunks} chunks");
            Ok(())
        }
        Command::Models => {
            let local = OllamaChatProvider::new(settings.ollama_config())?;
            shell::list_models(&local, &settings.ollama_model).await;
            Ok(())
        }
    }
}
