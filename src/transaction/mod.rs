//! Payment transactions for the ops API.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and its status and timestamp types
//! - Database functions for storing, querying, and updating transactions
//! - Payload validation and the HTTP handlers built on top of them

pub(crate) mod core;
mod create_endpoint;
mod list_endpoints;
mod payload;
pub(crate) mod query;
mod update_status_endpoint;

pub use core::{
    NewTransaction, Timestamp, Transaction, TransactionId, TransactionStatus, count_transactions,
    create_transaction, create_transaction_table, run_bad_query, seed_transactions_if_empty,
};
pub use create_endpoint::create_transaction_endpoint;
pub use list_endpoints::{
    get_recent_transactions_endpoint, get_transaction_by_order_endpoint,
    get_transactions_by_user_endpoint, search_transactions_endpoint,
};
pub use payload::{NewTransactionPayload, UpdateStatusPayload};
pub use query::TransactionFilter;
pub use update_status_endpoint::update_transaction_status_endpoint;
