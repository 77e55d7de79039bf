use anyhow::Result;
use axum::Router;
use chief_core::{spawn_load, DataPaths, Normalizer, PantryCell, Vocabulary};
use chief_server::build_app;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Directory holding Recipes.json and ing.json
    #[arg(long, env = "CHIEF_DATA_DIR", default_value = "./data")]
    data: String,
    /// Vocabulary overrides file (JSON)
    #[arg(long)]
    vocabulary: Option<String>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let vocabulary = match &args.vocabulary {
        Some(path) => Vocabulary::from_overrides_file(path)?,
        None => Vocabulary::default(),
    };
    let cell = Arc::new(PantryCell::new());
    // Serve immediately; data endpoints answer 503 until the load publishes.
    spawn_load(Arc::clone(&cell), DataPaths::new(&args.data), Arc::new(Normalizer::new(vocabulary)));
    let app: Router = build_app(cell);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, data = %args.data, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
