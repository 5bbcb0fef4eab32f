//! nl2sql-server: ask questions of a SQLite database in plain language.
//!
//! Runs the HTTP API by default; the other subcommands run one pipeline
//! operation in-process and print the result.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use nl2sql_core::store::sqlite::quote_identifier;
use nl2sql_core::store::{reset_sample_data, seed_sample_data};
use nl2sql_core::{DataStore, Nl2SqlService, OllamaBackend, SqliteStore};
use nl2sql_server::{
    api::create_router,
    config::{Args, Command},
    logging::init_logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_logging(&args.log_level, args.log_format);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    match args.command() {
        Command::Serve => serve(&args).await,
        Command::InitDb { reset } => init_db(&args, reset),
        Command::Ask {
            question,
            limit,
            execute,
        } => ask(&args, &question, limit, execute).await,
        Command::Models => {
            let service = build_service(&args)?;
            print_json(&service.available_models().await)
        }
        Command::Health => {
            let service = build_service(&args)?;
            print_json(&service.health().await)
        }
    }
}

fn open_store(args: &Args) -> anyhow::Result<SqliteStore> {
    let store = SqliteStore::open(&args.database_path)
        .with_context(|| format!("Failed to open database at {}", args.database_path.display()))?;

    if args.seed_sample_data {
        seed_sample_data(&store).context("Failed to seed sample data")?;
    }

    Ok(store)
}

fn build_service(args: &Args) -> anyhow::Result<Arc<Nl2SqlService>> {
    let store = open_store(args)?;
    let backend = OllamaBackend::new(&args.ollama_config())?;
    Ok(Arc::new(Nl2SqlService::new(
        Arc::new(backend),
        Arc::new(store),
        args.pipeline_config(),
    )))
}

async fn serve(args: &Args) -> anyhow::Result<()> {
    info!("======================================");
    info!("  NL2SQL - questions in, rows out");
    info!("======================================");
    info!("Listen: {}", args.listen_addr());
    info!("Database: {}", args.database_path.display());
    info!("Ollama: {} (model {})", args.ollama_base_url, args.ollama_model);
    info!("Default row limit: {}", args.default_row_limit);
    info!(
        "Timeouts: generation {}s, execution {}s",
        args.generation_timeout_secs, args.execution_timeout_secs
    );
    info!("======================================");

    let service = build_service(args)?;

    let health = service.health().await;
    if !health.ollama_connected {
        warn!("Ollama is not reachable at {}; generation requests will fail until it is", args.ollama_base_url);
    }

    let app = create_router(service);
    let listener = tokio::net::TcpListener::bind(args.listen_addr())
        .await
        .with_context(|| format!("Failed to bind {}", args.listen_addr()))?;
    info!("HTTP API listening on http://{}", args.listen_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn init_db(args: &Args, reset: bool) -> anyhow::Result<()> {
    let store = SqliteStore::open(&args.database_path)
        .with_context(|| format!("Failed to open database at {}", args.database_path.display()))?;

    if reset {
        reset_sample_data(&store)?;
    }
    seed_sample_data(&store)?;

    println!("Database ready at {}", args.database_path.display());
    for table in store.inspect_schema(0)?.tables {
        let count = store.execute(&format!(
            "SELECT COUNT(*) AS n FROM {}",
            quote_identifier(&table.name)
        ))?;
        let rows = count
            .rows
            .first()
            .and_then(|row| row.get("n"))
            .and_then(|n| n.as_u64())
            .unwrap_or(0);
        println!("  {}: {} columns, {} rows", table.name, table.columns.len(), rows);
    }

    Ok(())
}

async fn ask(args: &Args, question: &str, limit: Option<u32>, execute: bool) -> anyhow::Result<()> {
    let service = build_service(args)?;

    let success = if execute {
        let response = service.run_query(question, None, limit).await;
        print_json(&response)?;
        response.success
    } else {
        let response = service.generate_sql(question, None).await;
        print_json(&response)?;
        response.success
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
