use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use rankcrawl::api::create_router;
use rankcrawl::config::CONFIG;
use rankcrawl::search::{DEFAULT_LANGUAGE, DEFAULT_LOCATION, LiveOrchestrator, summarize};

#[derive(Parser)]
#[command(name = "rankcrawl", about = "SERP lookup, concurrent crawl and semantic re-ranking")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the JSON API
    Serve {
        /// Address to bind, overrides BIND_ADDR
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run one search and print the result as JSON
    Search {
        query: String,
        #[arg(long, default_value = DEFAULT_LOCATION)]
        location: String,
        #[arg(long, default_value = DEFAULT_LANGUAGE)]
        language: String,
        /// Print the summary instead of the full result
        #[arg(long)]
        summary: bool,
    },
    /// Check connectivity to the SERP provider and ranking service
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let engine = Arc::new(
        LiveOrchestrator::from_config(&CONFIG).context("Failed to build search pipeline")?,
    );

    match cli.command {
        Command::Serve { bind } => {
            let addr = bind.unwrap_or_else(|| CONFIG.bind_addr.clone());
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {addr}"))?;
            tracing::info!("listening on {addr}");
            axum::serve(listener, create_router(engine))
                .await
                .context("Server error")?;
        }
        Command::Search {
            query,
            location,
            language,
            summary,
        } => {
            let result = engine.search(query.trim(), &location, &language).await;
            let out = if summary {
                serde_json::to_string_pretty(&summarize(&result))?
            } else {
                serde_json::to_string_pretty(&result)?
            };
            println!("{out}");
        }
        Command::Status => {
            let services = engine.test_all_services().await;
            println!("{}", serde_json::to_string_pretty(&services)?);
        }
    }
    Ok(())
}
