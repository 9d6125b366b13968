//! CLI entry point for the Docent backend (for dev and testing).

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use docent_core::{
    app_data_dir, chunk_text, config_path, extract_text, load_config, load_config_from,
    save_config, status, AnswerSource, ChatRequest, ChatResponse, Config, OllamaClient, Router,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::Level;
use tracing_subscriber::EnvFilter;

const CLI_SESSION: &str = "cli";

#[derive(Parser)]
#[command(name = "docent")]
#[command(about = "Docent: ask questions about your documents")]
struct Cli {
    /// Config file to use instead of the one in the app data directory.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show backend status (for dev).
    Status,
    /// Show where Docent stores its config (app data directory).
    DataDir,
    /// Print the effective config as TOML.
    Config {
        /// Write the default config to the app data directory.
        #[arg(long)]
        init: bool,
    },
    /// Extract a document's text without calling any model.
    Extract {
        #[arg(value_name = "PATH")]
        path: PathBuf,
        /// List the chunks that would be embedded instead of the raw text.
        #[arg(long)]
        chunks: bool,
    },
    /// Ask one question, optionally about a document.
    Ask {
        question: String,
        /// Document (PDF or text) to answer from.
        #[arg(short, long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// Print the response as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Interactive session. `/load <path>` attaches a document to the next question.
    Chat {
        /// Document to attach to the first question.
        #[arg(short, long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => match load_config_from(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => load_config(),
    };

    let result = match cli.command.unwrap_or(Commands::Status) {
        Commands::Status => {
            println!("Docent backend");
            println!("  core: {}", status());
            println!("  ollama: {}", config.ollama_url);
            println!("  models: embed={} generate={}", config.embed_model, config.generate_model);
            Ok(())
        }
        Commands::DataDir => match app_data_dir() {
            Some(p) => {
                println!("{}", p.display());
                Ok(())
            }
            None => Err("could not determine app data directory".to_string()),
        },
        Commands::Config { init } => show_config(&config, init),
        Commands::Extract { path, chunks } => extract(&path, &config, chunks),
        Commands::Ask {
            question,
            file,
            json,
        } => ask(&config, question, file.as_deref(), json).await,
        Commands::Chat { file } => chat(&config, file).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn show_config(config: &Config, init: bool) -> Result<(), String> {
    if init {
        if let Some(path) = config_path().filter(|p| p.exists()) {
            return Err(format!("config already exists at {}", path.display()));
        }
        let path = save_config(&Config::default()).map_err(|e| e.to_string())?;
        println!("Wrote {}", path.display());
        return Ok(());
    }
    let s = toml::to_string_pretty(config).map_err(|e| e.to_string())?;
    print!("{}", s);
    Ok(())
}

fn extract(path: &Path, config: &Config, show_chunks: bool) -> Result<(), String> {
    let bytes = read_document(path)?;
    let text = extract_text(&bytes).map_err(|e| e.to_string())?;
    if !show_chunks {
        println!("{}", text);
        return Ok(());
    }
    let chunks = chunk_text(&text, &config.chunk_options());
    println!("{} chunk(s) from {}", chunks.len(), path.display());
    for c in chunks {
        let first = c.text.lines().next().unwrap_or("").trim();
        let preview: String = first.chars().take(60).collect();
        let ellipsis = if first.chars().count() > 60 { "..." } else { "" };
        println!("  [{}] {} chars  {}{}", c.index, c.text.chars().count(), preview, ellipsis);
    }
    Ok(())
}

fn build_router(config: &Config) -> Result<Router, String> {
    let client = Arc::new(OllamaClient::from_config(config).map_err(|e| e.to_string())?);
    Ok(Router::from_config(config, client.clone(), client))
}

fn read_document(path: &Path) -> Result<Vec<u8>, String> {
    std::fs::read(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))
}

async fn ask(config: &Config, question: String, file: Option<&Path>, json: bool) -> Result<(), String> {
    let router = build_router(config)?;
    let document = file.map(read_document).transpose()?;
    let response = router
        .handle(ChatRequest {
            question,
            document,
            session_id: CLI_SESSION.to_string(),
        })
        .await
        .map_err(|e| e.to_string())?;
    if json {
        let s = serde_json::to_string_pretty(&response).map_err(|e| e.to_string())?;
        println!("{}", s);
    } else {
        print_response(&response);
    }
    Ok(())
}

async fn chat(config: &Config, file: Option<PathBuf>) -> Result<(), String> {
    let router = build_router(config)?;
    let mut pending = file.as_deref().map(read_document).transpose()?;
    if let Some(path) = &file {
        println!("Attached {} to your first question.", path.display());
    }
    println!("Type a question, /load <path> to attach a document, /quit to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();
        let Some(line) = lines.next_line().await.map_err(|e| e.to_string())? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let question = match ChatInput::parse(line) {
            ChatInput::Quit => break,
            ChatInput::Load("") => {
                eprintln!("Usage: /load <path>");
                continue;
            }
            ChatInput::Load(path) => {
                let path = Path::new(path);
                match read_document(path) {
                    Ok(bytes) => {
                        pending = Some(bytes);
                        println!("Attached {} to your next question.", path.display());
                    }
                    Err(e) => eprintln!("Error: {}", e),
                }
                continue;
            }
            ChatInput::Question(question) => question,
        };

        let request = ChatRequest {
            question: question.to_string(),
            document: pending.take(),
            session_id: CLI_SESSION.to_string(),
        };
        match router.handle(request).await {
            Ok(response) => print_response(&response),
            Err(e) if e.is_user_error() => eprintln!("Could not read that document: {}", e),
            Err(e) => eprintln!("Error: {}", e),
        }
    }
    Ok(())
}

/// One trimmed, non-empty line typed in `chat`.
#[derive(Debug, PartialEq)]
enum ChatInput<'a> {
    Quit,
    /// `/load <path>`; the path may be empty.
    Load(&'a str),
    Question(&'a str),
}

impl<'a> ChatInput<'a> {
    fn parse(line: &'a str) -> Self {
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(c, r)| (c, r.trim()));
        match command {
            "/quit" | "/exit" if rest.is_empty() => ChatInput::Quit,
            "/load" => ChatInput::Load(rest),
            _ => ChatInput::Question(line),
        }
    }
}

fn print_response(response: &ChatResponse) {
    match response.source {
        AnswerSource::Document => println!("{}", response.answer),
        AnswerSource::Rules => println!("{}  (no document loaded)", response.answer),
        AnswerSource::Fallback => println!("{}  (model error, see log)", response.answer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_takes_the_rest_of_the_line() {
        assert_eq!(ChatInput::parse("/load doc.pdf"), ChatInput::Load("doc.pdf"));
        assert_eq!(
            ChatInput::parse("/load  my notes.txt "),
            ChatInput::Load("my notes.txt")
        );
        assert_eq!(ChatInput::parse("/load"), ChatInput::Load(""));
    }

    #[test]
    fn load_prefix_alone_is_a_question() {
        assert_eq!(ChatInput::parse("/loadfoo"), ChatInput::Question("/loadfoo"));
        assert_eq!(
            ChatInput::parse("/loading times?"),
            ChatInput::Question("/loading times?")
        );
    }

    #[test]
    fn quit_commands() {
        assert_eq!(ChatInput::parse("/quit"), ChatInput::Quit);
        assert_eq!(ChatInput::parse("/exit"), ChatInput::Quit);
        assert_eq!(ChatInput::parse("what is /quit"), ChatInput::Question("what is /quit"));
    }
}
