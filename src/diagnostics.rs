//! Endpoints for checking liveness and for rehearsing incidents.
//!
//! `/fail`, `/timeout` and `/transactions/bad-query` misbehave on purpose.

use std::time::Duration;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::{Error, db::Database, extract::ValidQuery, transaction::run_bad_query};

/// The body of the health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    /// Always "ok".
    pub status: &'static str,
}

/// Reports that the server is up. Does not touch the database.
pub async fn get_health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Always fails with an internal server error.
pub async fn get_fail() -> Result<Json<Health>, Error> {
    Err(Error::SimulatedFailure)
}

/// The default number of seconds slept by [get_timeout].
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 2;

/// The query string for [get_timeout].
#[derive(Debug, Deserialize)]
pub struct TimeoutParams {
    /// How long to sleep for.
    #[serde(default = "default_timeout_seconds")]
    pub seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

/// The body of the timeout response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slept {
    /// The number of seconds slept.
    pub slept: u64,
}

/// Sleep for the requested number of seconds before responding.
///
/// The sleep belongs to the request's future, so it stops as soon as the
/// future is dropped, e.g. when the client disconnects.
pub async fn get_timeout(ValidQuery(params): ValidQuery<TimeoutParams>) -> Json<Slept> {
    tokio::time::sleep(Duration::from_secs(params.seconds)).await;

    Json(Slept {
        slept: params.seconds,
    })
}

/// Query a table that does not exist, which always fails with an internal
/// server error.
pub async fn get_bad_query(State(database): State<Database>) -> Result<Json<Health>, Error> {
    let connection = database.connect()?;
    run_bad_query(&connection)?;

    Ok(Json(Health { status: "ok" }))
}
