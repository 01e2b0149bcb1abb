//! # Tutor CLI (`tutor`)
//!
//! Runs the curriculum service either as an HTTP server or one operation at
//! a time from the command line.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tutor init` | Create the SQLite database and run schema migrations |
//! | `tutor import <file>` | Load documents, standards and vectors from JSON |
//! | `tutor serve` | Start the HTTP server |
//! | `tutor search "<query>"` | Run one search |
//! | `tutor fetch <id>...` | Fetch documents by id |
//! | `tutor generate "<query>"` | Generate an answer from a context |
//! | `tutor validate "<content>"` | Score content against curriculum standards |
//!
//! Operation commands print the same JSON the HTTP server returns. On
//! failure they print the error envelope to stderr and exit with status 1.
//!
//! ## Examples
//!
//! ```bash
//! tutor init --config ./config/tutor.toml
//! tutor import ./data/curriculum.json
//! tutor search "¿Qué son las fracciones?" --grade 5 --subject Matemática
//! tutor validate "Las fracciones son partes de un entero." --grade 5 \
//!     --subject Matemática --expected-oa OA-MAT-5-03
//! ```

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use curriculum_rag::config;
use curriculum_rag::error::ServiceError;
use curriculum_rag::import;
use curriculum_rag::migrate;
use curriculum_rag::models::{FetchRequest, GenerationRequest, SearchQuery, ValidationRequest};
use curriculum_rag::server;
use curriculum_rag::service::CurriculumService;

/// Tutor: retrieval-and-generation core for a curriculum-aligned tutoring assistant.
#[derive(Parser)]
#[command(name = "tutor", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/tutor.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema (idempotent).
    Init,

    /// Import curriculum documents and ministry standards from a JSON file.
    ///
    /// Documents are embedded inline when an embedding provider is configured
    /// and the vector provider is `sqlite`.
    Import {
        /// Path to the JSON file.
        file: PathBuf,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// Semantic search over curriculum content.
    Search {
        query: String,
        #[arg(long)]
        grade: i64,
        #[arg(long)]
        subject: String,
        /// Maximum number of results (default 10, max 50).
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Fetch curriculum documents by id, in the given order.
    Fetch {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Generate a localized answer to a question from curriculum context.
    Generate {
        query: String,
        #[arg(long)]
        context: String,
        #[arg(long)]
        grade: i64,
        #[arg(long)]
        subject: String,
        /// OA code to mention in the prompt (repeatable).
        #[arg(long = "oa")]
        oa_codes: Vec<String>,
        /// `explanation`, `summary`, or `example`.
        #[arg(long)]
        style: Option<String>,
    },

    /// Score content against curriculum standards.
    Validate {
        content: String,
        #[arg(long)]
        grade: i64,
        #[arg(long)]
        subject: String,
        /// Expected OA code (repeatable).
        #[arg(long = "expected-oa")]
        expected_oa: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { file } => {
            let stats = import::run_import(&cfg, &file).await?;
            println!("imported documents: {}", stats.documents);
            println!("imported standards: {}", stats.standards);
            println!("indexed vectors: {}", stats.vectors);
            if stats.embed_failures > 0 {
                println!("embedding failures: {}", stats.embed_failures);
            }
            println!("ok");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Search {
            query,
            grade,
            subject,
            limit,
        } => {
            let service = CurriculumService::from_config(&cfg).await?;
            let req = SearchQuery {
                query,
                grade: Some(grade),
                subject,
                limit,
            };
            emit(service.search(&req).await)?;
        }
        Commands::Fetch { ids } => {
            let service = CurriculumService::from_config(&cfg).await?;
            emit(service.fetch(&FetchRequest { content_ids: ids }).await)?;
        }
        Commands::Generate {
            query,
            context,
            grade,
            subject,
            oa_codes,
            style,
        } => {
            let service = CurriculumService::from_config(&cfg).await?;
            let req = GenerationRequest {
                context,
                query,
                grade: Some(grade),
                subject,
                oa_codes,
                style,
            };
            emit(service.generate(&req).await)?;
        }
        Commands::Validate {
            content,
            grade,
            subject,
            expected_oa,
        } => {
            let service = CurriculumService::from_config(&cfg).await?;
            let req = ValidationRequest {
                content,
                grade: Some(grade),
                subject,
                expected_oa,
            };
            emit(service.validate(&req).await)?;
        }
    }

    Ok(())
}

/// Prints a result as pretty JSON, or the error envelope and exits 1.
fn emit<T: Serialize>(result: Result<T, ServiceError>) -> anyhow::Result<()> {
    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", serde_json::to_string_pretty(&e.envelope())?);
            std::process::exit(1);
        }
    }
}
