use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use swot::server::{AppState, router};
use swot::{NoteStore, ask};
use tracing::info;

/// swot - study-notes server with an AI explanation endpoint
#[derive(Parser)]
#[command(name = "swot")]
#[command(about = "A study-notes server with an AI explanation endpoint")]
#[command(version)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Path to the notes JSON file
    #[arg(long, default_value = "data/notes.json", value_name = "FILE")]
    data_file: PathBuf,

    /// Never write the notes file; note creation returns copy-paste content
    /// instead (also enabled by SWOT_READ_ONLY=1)
    #[arg(long)]
    read_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "swot=debug,tower_http=debug".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let read_only = cli.read_only || read_only_from_env();
    let store = NoteStore::new(&cli.data_file, read_only);
    let state = AppState {
        store: Arc::new(store),
        http: ask::http_client()?,
    };

    info!(
        listen = %cli.listen,
        data_file = %cli.data_file.display(),
        read_only,
        "starting swot"
    );

    let listener = tokio::net::TcpListener::bind(cli.listen).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn read_only_from_env() -> bool {
    std::env::var("SWOT_READ_ONLY").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}
