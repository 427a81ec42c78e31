//! The interactive prompt.

use anyhow::Result;
use ragswitch_model::LlmProvider;
use ragswitch_model::ollama::OllamaChatProvider;
use ragswitch_rag::ChatResponse;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::app::App;
use crate::samples::EXAMPLE_QUESTIONS;

/// One line of user input, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `ask [question]`; without a question the shell prompts for one.
    Ask(Option<String>),
    /// `switch [provider]`; without a name the other provider is chosen.
    Switch(Option<String>),
    Info,
    Examples,
    Models,
    Help,
    Quit,
    /// Anything else is a question.
    Question(String),
    Empty,
}

impl Command {
    /// Interpret a line. Command words are case-insensitive.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        let arg = (!rest.is_empty()).then(|| rest.to_string());

        match head.to_ascii_lowercase().as_str() {
            "ask" | "query" => Self::Ask(arg),
            "switch" => Self::Switch(arg),
            "info" if arg.is_none() => Self::Info,
            "examples" if arg.is_none() => Self::Examples,
            "models" if arg.is_none() => Self::Models,
            "help" | "h" | "?" if arg.is_none() => Self::Help,
            "quit" | "exit" | "q" if arg.is_none() => Self::Quit,
            _ => Self::Question(line.to_string()),
        }
    }
}

pub const HELP: &str = "\
Commands:
  ask [question]     Ask a question (or just type it)
  switch [provider]  Switch between cloud (OpenAI) and local (Ollama)
  info               Show the current configuration
  examples           Show example questions
  models             List models installed in Ollama
  help               Show this menu
  quit               Exit";

/// Run the read-eval-print loop until `quit` or end of input.
pub async fn run(app: &mut App) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("{HELP}");

    loop {
        let line = match editor.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if !line.trim().is_empty() {
            let _ = editor.add_history_entry(line.as_str());
        }

        match Command::parse(&line) {
            Command::Empty => {}
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
            Command::Examples => print_examples(),
            Command::Info => print_info(app),
            Command::Models => list_models(&app.local, &app.settings.ollama_model).await,
            Command::Switch(name) => switch(app, name.as_deref()),
            Command::Question(question) | Command::Ask(Some(question)) => {
                ask(app, &question, false).await;
            }
            Command::Ask(None) => match editor.readline("  question: ") {
                Ok(question) if !question.trim().is_empty() => {
                    ask(app, question.trim(), false).await;
                }
                Ok(_) => {}
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            },
        }
    }
    println!("Goodbye!");
    Ok(())
}

/// Answer one question, printing the reply or the error. Never fails the loop.
pub async fn ask(app: &App, question: &str, verbose: bool) {
    debug!(question, "handling question");
    match app.bot.chat(question, verbose).await {
        Ok(reply) => print_reply(question, &reply),
        Err(e) => eprintln!("error: {e}"),
    }
}

/// Print an answer, plus retrieval details when the reply is verbose.
pub fn print_reply(question: &str, reply: &ChatResponse) {
    let rule = "=".repeat(70);
    println!(
        "\n{rule}\nQuestion: {question}\nModel:    {} ({})\n{rule}\n",
        reply.model_name, reply.provider
    );

    if let Some(docs) = &reply.retrieved_docs {
        println!("Retrieved {} chunk(s):", docs.len());
        for (i, doc) in docs.iter().enumerate() {
            let distance = doc.distance.map_or_else(|| "-".to_string(), |d| format!("{d:.4}"));
            println!(
                "  {}. {} #{} (distance {distance})",
                i + 1,
                doc.metadata.source,
                doc.metadata.chunk_index
            );
        }
        println!();
    }
    if let Some(prompt) = &reply.full_prompt {
        println!("--- Prompt ---\n{prompt}\n--- End prompt ---\n");
    }

    println!("{}\n{rule}", reply.answer.trim());
}

fn switch(app: &mut App, name: Option<&str>) {
    let target = match name {
        Some(name) => match name.parse::<LlmProvider>() {
            Ok(target) => target,
            Err(e) => {
                eprintln!("error: {e}");
                return;
            }
        },
        None => app.bot.provider().toggled(),
    };
    if target == LlmProvider::Cloud && !app.settings.has_openai_key() {
        eprintln!("error: cannot switch to the cloud provider, OPENAI_API_KEY is not set");
        return;
    }
    match app.bot.switch(target.as_str()) {
        Ok(active) => {
            let place = match active {
                LlmProvider::Cloud => "cloud inference",
                LlmProvider::Local => "local inference",
            };
            println!("Switched to {active} ({}), now using {place}", app.bot.model_name());
        }
        Err(e) => eprintln!("error: {e}"),
    }
}

fn print_examples() {
    println!("Example questions:");
    for (i, question) in EXAMPLE_QUESTIONS.iter().enumerate() {
        println!("  {}. {question}", i + 1);
    }
}

/// Print the active configuration.
pub fn print_info(app: &App) {
    let s = &app.settings;
    let embedding_model = app.bot.index().embedder().model_name();
    println!("Provider:       {} ({})", app.bot.provider(), app.bot.model_name());
    println!("Cloud model:    {}", app.bot.model_name_for(LlmProvider::Cloud));
    println!(
        "Local model:    {} at {}",
        app.bot.model_name_for(LlmProvider::Local),
        s.ollama_base_url
    );
    println!("Embeddings:     {} ({embedding_model})", app.embedding);
    println!("Index:          {} [{}]", s.index_dir.display(), s.collection_name);
    println!("Chunking:       {} tokens, {} overlap", s.rag.chunk_size, s.rag.chunk_overlap);
    println!("Retrieval:      {} chunk(s) per question", app.bot.n_results());
    println!(
        "Generation:     temperature {}, up to {} tokens{}",
        app.bot.temperature(),
        app.bot.max_tokens(),
        if s.fast { " (fast profile)" } else { "" }
    );
    println!("OpenAI key:     {}", if s.has_openai_key() { "set" } else { "not set" });
}

/// Print the models installed on the Ollama server, marking `configured`.
pub async fn list_models(local: &OllamaChatProvider, configured: &str) {
    match local.list_models().await {
        Ok(models) if models.is_empty() => {
            println!("No models installed. Try `ollama pull llama3`.");
        }
        Ok(models) => {
            println!("Installed Ollama models:");
            for model in models {
                let is_configured =
                    model.name == configured || model.name == format!("{configured}:latest");
                let marker = if is_configured { "*" } else { " " };
                println!("  {marker} {:<32} {:>8.1} GB", model.name, model.size as f64 / 1e9);
            }
        }
        Err(e) => eprintln!("error: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_words() {
        assert_eq!(Command::parse("  "), Command::Empty);
        assert_eq!(Command::parse("QUIT"), Command::Quit);
        assert_eq!(Command::parse("exit"), Command::Quit);
        assert_eq!(Command::parse("help"), Command::Help);
        assert_eq!(Command::parse("info"), Command::Info);
        assert_eq!(Command::parse("examples"), Command::Examples);
        assert_eq!(Command::parse("models"), Command::Models);
        assert_eq!(Command::parse("switch"), Command::Switch(None));
        assert_eq!(Command::parse("switch ollama"), Command::Switch(Some("ollama".into())));
    }

    #[test]
    fn ask_takes_optional_question() {
        assert_eq!(Command::parse("ask"), Command::Ask(None));
        assert_eq!(Command::parse("ask  What is RAG? "), Command::Ask(Some("What is RAG?".into())));
    }

    #[test]
    fn other_input_is_a_question() {
        assert_eq!(
            Command::parse("How do I install Ollama?"),
            Command::Question("How do I install Ollama?".into())
        );
        // A command word followed by text reads as a question.
        assert_eq!(Command::parse("info about RAG"), Command::Question("info about RAG".into()));
    }
}
