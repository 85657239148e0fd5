//! Checkout-ledger node: HTTP front end over the in-memory hash chain.

mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use checkout_core::chain::Chain;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};

#[derive(Parser, Debug)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:3000
    #[arg(long, default_value = "127.0.0.1:3000")]
    listen: String,
}

/// Shared application state passed to the axum handlers. The chain lives
/// for the process duration; appends take the write lock, reads the read
/// lock, and no lock is held across an await.
#[derive(Clone)]
pub struct AppState {
    pub chain: Arc<RwLock<Chain>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let chain = Chain::new()?;
    info!(height = chain.len(), genesis = %chain.tip().hash, "chain initialized");

    let state = AppState {
        chain: Arc::new(RwLock::new(chain)),
    };

    let app = Router::new()
        .route("/", get(routes::read_chain).post(routes::write_checkout))
        .route("/new", post(routes::register_book))
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = args.listen.parse()?;
    info!("checkout-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
