use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use vesper_revenue::{
    api, config::Config, db::init_db, ChainEvent, ChainReader, Indexer, Repository,
    RpcChainReader,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        tracing::error!(error = %format!("{:#}", e), "fatal error");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let pool = init_db(&config.database_path)
        .await
        .context("failed to initialize database")?;
    let repo = Arc::new(Repository::new(pool));

    let reader: Arc<dyn ChainReader> = Arc::new(
        RpcChainReader::new(&config.rpc_url).context("failed to configure RPC reader")?,
    );
    let indexer = Indexer::new(reader, repo.clone(), config.clone());

    let app = api::create_router(api::AppState::new(repo, config.clone()));
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    tracing::info!("Server listening on {}", addr);

    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    // Events are applied strictly in arrival order
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_number = 0u64;
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }
        let event: ChainEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(line = line_number, error = %e, "skipping malformed event");
                continue;
            }
        };
        let outcome = indexer
            .handle(&event)
            .await
            .with_context(|| format!("persisting {} event at line {}", event.kind(), line_number))?;
        tracing::debug!(line = line_number, ?outcome, "event handled");
    }

    tracing::info!(events = line_number, "event stream closed, serving read API");
    server.await.context("server task failed")??;
    Ok(())
}
