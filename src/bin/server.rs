use std::{error::Error, net::SocketAddr};

use axum_server::Handle;
use clap::Parser;
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};

use ops_api::{
    AppState, Database, LOGGER_NAME, build_router, graceful_shutdown, json_subscriber,
    pipe_tolerant_stdout,
};

/// The REST API server for the ops drill transactions service.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "OPS_API_DB_PATH", default_value = "app.db")]
    db_path: String,

    /// The address to bind to.
    #[arg(long, env = "OPS_API_HOST", default_value = "127.0.0.1")]
    host: String,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Do not add the demo transactions to an empty database.
    #[arg(long)]
    no_seed: bool,

    /// Which log events to emit, in `tracing_subscriber::EnvFilter` syntax.
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_filter: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    json_subscriber(pipe_tolerant_stdout(), EnvFilter::try_new(&args.log_filter)?).init();

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;

    let state = AppState::new(Database::new(&args.db_path), !args.no_seed)?;

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(state);

    tracing::info!(target: LOGGER_NAME, "HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    Ok(())
}
