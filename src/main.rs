use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use policydesk::app::{build_router, AppState};
use policydesk::chat::client::PortalClient;
use policydesk::chat::session::ChatSession;
use policydesk::config::AppConfig;
use policydesk::db::repository::{DocumentRepository, InMemoryDocumentRepository};
use policydesk::excel::analysis::TemplateAnalysis;
use policydesk::llm::client::{CompletionProvider, HttpCompletionProvider};
use policydesk::rag::client::HttpRagService;

/// Banking-regulation policy portal.
#[derive(Parser, Debug)]
#[command(name = "policydesk", version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API (default).
    Serve,

    /// Ask a running portal a question.
    Ask {
        /// Base URL of the portal.
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        server: String,

        /// Title of a selected document. Repeatable.
        #[arg(long = "document")]
        documents: Vec<String>,

        question: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "policydesk=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(cli.config).await,
        Commands::Ask {
            server,
            documents,
            question,
        } => ask(&server, documents, question).await,
    }
}

async fn serve(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    tracing::info!("Starting policydesk server...");

    let config = AppConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    let documents = policydesk::seed::load_catalog(config.library.catalog_path.as_deref()).await?;
    let repo: Arc<dyn DocumentRepository> = Arc::new(InMemoryDocumentRepository::new(documents));

    let llm: Option<Arc<dyn CompletionProvider>> =
        match HttpCompletionProvider::from_config(&config.llm)? {
            Some(provider) => {
                tracing::info!(model = %config.llm.model, "LLM client initialized");
                Some(Arc::new(provider))
            }
            None => {
                tracing::warn!("No LLM API key configured; /api/ask will answer with an error");
                None
            }
        };

    let rag = Arc::new(HttpRagService::from_config(&config.rag)?);
    tracing::info!(url = %config.rag.url, "RAG service client initialized");

    let addr = config.server.addr.clone();
    let state = AppState {
        repo,
        llm,
        rag,
        analysis: Arc::new(TemplateAnalysis),
        config: Arc::new(config),
    };

    let app = build_router(state);

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app.into_make_service())
        .await
        .context("Server error")?;
    Ok(())
}

async fn ask(server: &str, documents: Vec<String>, question: String) -> anyhow::Result<()> {
    let client = PortalClient::new(server)?;
    let mut session = ChatSession::new();
    session.set_input(question);

    if !client.send(&mut session, &documents).await {
        anyhow::bail!("Nothing to ask: the question is empty");
    }

    if let Some(reply) = session.messages().last() {
        println!("{}", reply.content);
        if !reply.sources.is_empty() {
            println!("\nSources:");
            for source in &reply.sources {
                println!("  - {} ({})", source.title, source.source_url);
            }
        }
        if let Some(confidence) = &reply.confidence {
            println!("\nConfidence: {confidence}");
        }
    }
    Ok(())
}
