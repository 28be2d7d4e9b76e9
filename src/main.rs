//! # docqa CLI (`dqa`)
//!
//! The `dqa` binary drives the document Q&A service. It can inspect the
//! corpus, score queries, run the full answer pipeline in the terminal, and
//! start the HTTP/SSE server.
//!
//! ## Usage
//!
//! ```bash
//! dqa --config ./config/docqa.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dqa documents` | List the documents loaded from the corpus directory |
//! | `dqa search "<query>"` | Score pages and print the top matches |
//! | `dqa ask "<query>"` | Run the full answer pipeline to stdout |
//! | `dqa serve` | Start the HTTP server with the SSE chat stream |

use anyhow::Result;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use docqa::config;
use docqa::events::StreamEvent;
use docqa::generate;
use docqa::pipeline;
use docqa::scorer;
use docqa::server;
use docqa::store::DocumentStore;

/// docqa — answer questions against a local document corpus, with streamed,
/// cited answers.
#[derive(Parser)]
#[command(
    name = "dqa",
    about = "docqa — a local document question-answering server with streamed, cited answers",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docqa.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the documents loaded from the corpus directory.
    Documents,

    /// Score pages against a query and print the top matches.
    Search {
        /// The query text.
        query: String,
    },

    /// Run the full answer pipeline and print the streamed answer.
    Ask {
        /// The question to answer.
        query: String,
    },

    /// Start the HTTP server with the SSE chat stream.
    Serve,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Documents => {
            let store = DocumentStore::open(&config.documents.dir)?;
            let documents = store.list();
            if documents.is_empty() {
                println!("No documents loaded.");
            } else {
                for name in documents {
                    println!("{}", name);
                }
            }
        }

        Commands::Search { query } => {
            let store = DocumentStore::open(&config.documents.dir)?;
            let corpus = store.snapshot();
            let matches = scorer::search(&query, &corpus);
            if matches.is_empty() {
                println!("No results.");
            } else {
                for (i, m) in matches.iter().enumerate() {
                    println!("{}. {} (page {})", i + 1, m.document, m.page);
                    println!("    excerpt: \"{}\"", m.excerpt.replace('\n', " "));
                    println!();
                }
            }
        }

        Commands::Ask { query } => {
            let store = Arc::new(DocumentStore::open(&config.documents.dir)?);
            let provider: Arc<dyn generate::AnswerProvider> =
                Arc::from(generate::create_provider(&config.generation)?);
            let stream = pipeline::answer_events(store, provider, config.pacing, query);
            futures::pin_mut!(stream);

            let mut in_text = false;
            while let Some(event) = stream.next().await {
                if in_text && !matches!(event, StreamEvent::Text { .. }) {
                    println!();
                    in_text = false;
                }
                match event {
                    StreamEvent::ToolCall { data } => eprintln!("[{}] {}", data.tool, data.status),
                    StreamEvent::Citation { data } => {
                        println!("[{}] {} (page {})", data.id, data.document, data.page);
                    }
                    StreamEvent::Text { content } => {
                        print!("{}", content);
                        std::io::stdout().flush().ok();
                        in_text = true;
                    }
                    StreamEvent::Source { data } => {
                        println!("[{}] {} - {} (page {})", data.id, data.title, data.document, data.page);
                    }
                    StreamEvent::Done => {}
                    StreamEvent::Error { content } => eprintln!("error: {}", content),
                }
            }
        }

        Commands::Serve => {
            server::run_server(&config).await?;
        }
    }

    Ok(())
}
