//! Defines the endpoint for creating a new transaction.

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    Error,
    db::Database,
    extract::ValidJson,
    transaction::{NewTransactionPayload, Timestamp, Transaction, core::create_transaction},
};

/// A route handler for creating a new transaction.
///
/// Responds with 201 and the full row as stored, 422 if the payload is
/// invalid, or 409 if the order ID is already taken.
pub async fn create_transaction_endpoint(
    State(database): State<Database>,
    ValidJson(payload): ValidJson<NewTransactionPayload>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let new_transaction = payload.validate()?;

    let connection = database.connect()?;
    let transaction = create_transaction(&new_transaction, Timestamp::now(), &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}
