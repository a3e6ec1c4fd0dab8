use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use pdf_chat_core::{
    build_chunks, extract_documents, load_pdf_sources, BatchPolicy, CharacterNgramEmbedder,
    ChatError, ChatSession, ChunkingConfig, Embedder, LopdfExtractor, OllamaClient, OllamaConfig,
    OllamaEmbedder, OllamaModel, PipelineOptions, Turn,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-chat", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Ollama base URL
    #[arg(long, env = "OLLAMA_HOST", default_value = "http://localhost:11434", global = true)]
    ollama_url: String,

    /// Bearer token for an Ollama server behind an authenticating proxy
    #[arg(long, env = "OLLAMA_API_KEY", hide_env_values = true, global = true)]
    ollama_api_key: Option<String>,

    /// Embedding model served by Ollama
    #[arg(long, env = "PDF_CHAT_EMBEDDING_MODEL", default_value = "all-minilm", global = true)]
    embedding_model: String,

    /// Chat model served by Ollama
    #[arg(long, env = "PDF_CHAT_MODEL", default_value = "deepseek-r1:1.5b", global = true)]
    chat_model: String,

    /// Sampling temperature passed to the chat model
    #[arg(long, env = "PDF_CHAT_TEMPERATURE", global = true)]
    temperature: Option<f32>,

    /// Request timeout in seconds; unset waits for the model as long as it takes
    #[arg(long, env = "PDF_CHAT_TIMEOUT_SECS", global = true)]
    timeout_secs: Option<u64>,

    /// Which embedder builds the index
    #[arg(long, value_enum, env = "PDF_CHAT_EMBEDDER", default_value = "ollama", global = true)]
    embedder: EmbedderKind,

    /// Maximum chunk length in characters
    #[arg(long, default_value = "1000", global = true)]
    chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, default_value = "200", global = true)]
    chunk_overlap: usize,

    /// Chunks retrieved per question
    #[arg(long, default_value = "4", global = true)]
    top_k: usize,

    /// Do not rewrite follow-up questions before retrieval
    #[arg(long, default_value_t = false, global = true)]
    no_condense: bool,

    /// Reject the whole upload when any pdf fails to parse
    #[arg(long, default_value_t = false, global = true)]
    strict: bool,

    /// Write the conversation history as JSON when the command finishes
    #[arg(long, global = true)]
    transcript: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum EmbedderKind {
    /// Embedding model served by Ollama
    Ollama,
    /// Offline character trigram hashing, no server needed
    Ngram,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat. Plain lines are questions; `:process PATH...`,
    /// `:history` and `:quit` are commands.
    Chat {
        /// PDF files or folders to process before the first question.
        #[arg(long = "pdf")]
        pdfs: Vec<PathBuf>,
    },
    /// Process PDFs and answer one or more questions in order.
    Ask {
        /// PDF files or folders.
        #[arg(long = "pdf", required = true)]
        pdfs: Vec<PathBuf>,
        /// Question to ask; repeat for follow-ups.
        #[arg(long = "question", required = true)]
        questions: Vec<String>,
        /// Print the retrieved chunks under each answer.
        #[arg(long, default_value_t = false)]
        show_sources: bool,
    },
    /// Print the extracted text statistics and chunks without calling any model.
    Extract {
        /// PDF files or folders.
        #[arg(long = "pdf", required = true)]
        pdfs: Vec<PathBuf>,
        /// Print each chunk in full.
        #[arg(long, default_value_t = false)]
        show_chunks: bool,
    },
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        started_at = %Utc::now().to_rfc3339(),
        "pdf-chat boot"
    );

    let options = pipeline_options(&cli);
    options
        .validate()
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    match &cli.command {
        Command::Extract { pdfs, show_chunks } => run_extract(pdfs, &options, *show_chunks),
        Command::Ask {
            pdfs,
            questions,
            show_sources,
        } => {
            let mut session = build_session(&cli, options)?;
            process(&mut session, pdfs)?;
            for question in questions {
                ask(&mut session, question, *show_sources)?;
            }
            write_transcript(cli.transcript.as_deref(), session.history())
        }
        Command::Chat { pdfs } => {
            let mut session = build_session(&cli, options)?;
            if !pdfs.is_empty() {
                if let Err(error) = process(&mut session, pdfs) {
                    error!(reason = %error, "processing failed");
                    println!("error: {error:#}");
                }
            }
            run_chat(&mut session)?;
            write_transcript(cli.transcript.as_deref(), session.history())
        }
    }
}

fn pipeline_options(cli: &Cli) -> PipelineOptions {
    PipelineOptions {
        chunk_max_chars: cli.chunk_size,
        chunk_overlap_chars: cli.chunk_overlap,
        top_k: cli.top_k,
        condense_question: !cli.no_condense,
        batch_policy: if cli.strict {
            BatchPolicy::AbortBatch
        } else {
            BatchPolicy::SkipAndReport
        },
        ..PipelineOptions::default()
    }
}

fn build_session(cli: &Cli, options: PipelineOptions) -> anyhow::Result<ChatSession> {
    let config = OllamaConfig {
        base_url: cli.ollama_url.clone(),
        embedding_model: cli.embedding_model.clone(),
        chat_model: cli.chat_model.clone(),
        temperature: cli.temperature,
        request_timeout_secs: cli.timeout_secs,
        api_key: cli.ollama_api_key.clone(),
    };
    let client = OllamaClient::new(&config).context("unable to configure the ollama client")?;

    let embedder: Arc<dyn Embedder> = match cli.embedder {
        EmbedderKind::Ollama => Arc::new(OllamaEmbedder::new(
            client.clone(),
            config.embedding_model.clone(),
        )),
        EmbedderKind::Ngram => Arc::new(CharacterNgramEmbedder::default()),
    };
    let llm = Arc::new(
        OllamaModel::new(client, config.chat_model.clone()).with_temperature(config.temperature),
    );

    let session = ChatSession::new(options, Box::new(LopdfExtractor), embedder, llm)
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;
    info!(
        session = %session.id(),
        ollama = %config.base_url,
        chat_model = %config.chat_model,
        "session ready"
    );
    Ok(session)
}

fn process(session: &mut ChatSession, pdfs: &[PathBuf]) -> anyhow::Result<()> {
    let sources = load_pdf_sources(pdfs).map_err(|error| anyhow::anyhow!(error.to_string()))?;
    let summary = session
        .process(&sources)
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    for skipped in &summary.skipped {
        println!("skipped {}: {}", skipped.name, skipped.reason);
    }
    println!(
        "processed {} pdf(s): {} characters in {} chunk(s)",
        summary.documents.len(),
        summary.char_count,
        summary.chunk_count
    );
    Ok(())
}

fn ask(session: &mut ChatSession, question: &str, show_sources: bool) -> anyhow::Result<()> {
    match session.ask(question) {
        Ok(reply) => {
            println!("You: {question}");
            println!("Bot: {}", reply.answer);
            if show_sources {
                for hit in &reply.sources {
                    println!(
                        "  [chunk {} score={:.4}]\n{}",
                        hit.chunk.chunk_index, hit.score, hit.chunk.text
                    );
                }
            }
            Ok(())
        }
        Err(ChatError::NotReady) => {
            println!("{}", ChatError::NotReady);
            Ok(())
        }
        Err(ChatError::EmptyQuestion) => Ok(()),
        Err(error) => Err(anyhow::anyhow!(error.to_string())),
    }
}

fn run_chat(session: &mut ChatSession) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        if line == ":quit" || line == ":q" {
            break;
        }

        if line == ":history" {
            print_history(session.history());
            continue;
        }

        if let Some(rest) = line.strip_prefix(":process") {
            let paths = rest.split_whitespace().map(PathBuf::from).collect::<Vec<_>>();
            if paths.is_empty() {
                println!("usage: :process PATH...");
                continue;
            }
            if let Err(error) = process(session, &paths) {
                error!(reason = %error, "processing failed");
                println!("error: {error:#}");
            }
            continue;
        }

        if let Err(error) = ask(session, line, false) {
            error!(reason = %error, "question failed");
            println!("error: {error:#}");
        }
    }

    Ok(())
}

fn print_history(history: &[Turn]) {
    if history.is_empty() {
        println!("(no questions asked yet)");
    }
    for turn in history {
        println!("[{}] You: {}", turn.asked_at.format("%H:%M:%S"), turn.question);
        println!("Bot: {}", turn.answer);
    }
}

fn run_extract(pdfs: &[PathBuf], options: &PipelineOptions, show_chunks: bool) -> anyhow::Result<()> {
    let sources = load_pdf_sources(pdfs).map_err(|error| anyhow::anyhow!(error.to_string()))?;
    let batch = extract_documents(&LopdfExtractor, &sources, options.batch_policy)
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    for document in &batch.documents {
        println!(
            "{} pages={} chars={} sha256={}",
            document.name, document.page_count, document.char_count, document.checksum
        );
    }
    for skipped in &batch.skipped {
        println!("skipped {}: {}", skipped.name, skipped.reason);
    }

    let chunks = build_chunks(&batch.text, ChunkingConfig::from(options));
    println!("{} chunk(s)", chunks.len());
    for chunk in &chunks {
        if show_chunks {
            println!("--- chunk {} ---\n{}", chunk.chunk_index, chunk.text);
        } else {
            println!("chunk {} chars={}", chunk.chunk_index, chunk.text.chars().count());
        }
    }
    Ok(())
}

fn write_transcript(path: Option<&Path>, history: &[Turn]) -> anyhow::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };

    let json = serde_json::to_string_pretty(history)?;
    std::fs::write(path, json)
        .with_context(|| format!("unable to write transcript to {}", path.display()))?;
    info!(path = %path.display(), turns = history.len(), "transcript written");
    Ok(())
}
