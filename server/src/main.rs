use anyhow::Result;
use axum::Router;
use clap::Parser;
use search_core::config::MAX_RESULT_DOCUMENT_COUNT;
use search_core::SearchConfig;
use search_server::{build_app, AppOptions};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Corpus file or directory indexed at startup
    #[arg(long)]
    corpus: Option<PathBuf>,
    /// Space separated stop words
    #[arg(long, default_value = "")]
    stop_words: String,
    /// Maximum number of ranked documents per query
    #[arg(long, default_value_t = MAX_RESULT_DOCUMENT_COUNT)]
    max_results: usize,
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
    let options = AppOptions {
        corpus: args.corpus,
        stop_words: args.stop_words,
        config: SearchConfig::default().with_max_results(args.max_results),
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
        cors_allow_origin: std::env::var("CORS_ALLOW_ORIGIN").ok(),
    };
    let app: Router = build_app(options)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
