//! An operations-drill API for payment transactions.
//!
//! The service stores transactions in SQLite and exposes them over a small
//! JSON REST API. Alongside the normal endpoints it carries a few that fail on
//! purpose (an error, a slow response and a broken query) so that alerting and
//! runbooks can be rehearsed against real log output.
//!
//! Every request is logged as a single JSON line tagged with a request ID,
//! and every unhandled failure is answered with a generic 500 that carries the
//! same ID.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod db;
mod diagnostics;
pub mod endpoints;
mod error;
mod extract;
mod logging;
mod routing;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use db::{Database, initialize as initialize_db};
pub use error::{Error, FieldError, UnhandledError};
pub use logging::{
    LOGGER_NAME, PipeTolerantWriter, REQUEST_ID_HEADER, add_request_logging, json_subscriber,
    pipe_tolerant_stdout,
};
pub use routing::build_router;
pub use transaction::{
    NewTransaction, Timestamp, Transaction, TransactionFilter, TransactionId, TransactionStatus,
    count_transactions, create_transaction,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(target: LOGGER_NAME, "failed to listen for ctrl+c: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(target: LOGGER_NAME, "failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!(target: LOGGER_NAME, "Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!(target: LOGGER_NAME, "Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
