//! Defines the read-only endpoints for fetching and searching transactions.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::{
    Error,
    db::Database,
    extract::ValidQuery,
    transaction::{
        Transaction, TransactionFilter,
        core::{get_recent_transactions, get_transaction_by_order_id, get_transactions_by_user},
        query::{DEFAULT_SEARCH_LIMIT, search_transactions},
    },
};

/// The number of rows returned by the listing endpoints when no limit is given.
pub const DEFAULT_LIST_LIMIT: i64 = 25;

/// The query parameters for the listing endpoints.
#[derive(Debug, Deserialize)]
pub struct LimitParams {
    /// The maximum number of rows to return. Negative means no limit.
    #[serde(default = "default_list_limit")]
    pub limit: i64,
}

fn default_list_limit() -> i64 {
    DEFAULT_LIST_LIMIT
}

/// The query parameters for searching transactions.
///
/// Empty strings are treated the same as a missing parameter. The status is
/// not checked against the known statuses, an unknown one simply matches
/// nothing.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Only include transactions with this status.
    pub status: Option<String>,
    /// Only include transactions of at least this many cents.
    pub min_amount_cents: Option<i64>,
    /// Only include transactions of at most this many cents.
    pub max_amount_cents: Option<i64>,
    /// Only include transactions made by this user.
    pub user_id: Option<String>,
    /// The maximum number of rows to return. Negative means no limit.
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

fn default_search_limit() -> i64 {
    DEFAULT_SEARCH_LIMIT
}

impl From<SearchParams> for TransactionFilter {
    fn from(params: SearchParams) -> Self {
        TransactionFilter {
            status: non_empty(params.status),
            user_id: non_empty(params.user_id),
            min_amount_cents: params.min_amount_cents,
            max_amount_cents: params.max_amount_cents,
            limit: params.limit,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

/// A route handler for the most recently created transactions.
pub async fn get_recent_transactions_endpoint(
    State(database): State<Database>,
    ValidQuery(params): ValidQuery<LimitParams>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = database.connect()?;
    let transactions = get_recent_transactions(params.limit, &connection)?;

    Ok(Json(transactions))
}

/// A route handler for a user's transactions, newest first.
///
/// An unknown user gets an empty list rather than a 404.
pub async fn get_transactions_by_user_endpoint(
    State(database): State<Database>,
    Path(user_id): Path<String>,
    ValidQuery(params): ValidQuery<LimitParams>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = database.connect()?;
    let transactions = get_transactions_by_user(&user_id, params.limit, &connection)?;

    Ok(Json(transactions))
}

/// A route handler for looking up a single transaction by its order ID.
pub async fn get_transaction_by_order_endpoint(
    State(database): State<Database>,
    Path(order_id): Path<String>,
) -> Result<Json<Transaction>, Error> {
    let connection = database.connect()?;
    let transaction = get_transaction_by_order_id(&order_id, &connection)?;

    Ok(Json(transaction))
}

/// A route handler for searching transactions by status, user and amount.
pub async fn search_transactions_endpoint(
    State(database): State<Database>,
    ValidQuery(params): ValidQuery<SearchParams>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let filter = TransactionFilter::from(params);

    let connection = database.connect()?;
    let transactions = search_transactions(&filter, &connection)?;

    Ok(Json(transactions))
}
