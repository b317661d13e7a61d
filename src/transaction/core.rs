//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize, Serializer};
use time::{
    OffsetDateTime, UtcOffset,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};

use crate::{Error, error::FieldError, logging::LOGGER_NAME};

// ============================================================================
// MODELS
// ============================================================================

/// Alias for the integer type used for transaction IDs.
pub type TransactionId = i64;

/// The outcome of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// The payment went through.
    Approved,
    /// The payment was refused.
    Declined,
    /// The payment has not been decided yet.
    #[default]
    Pending,
}

impl TransactionStatus {
    /// Every status, in the order they are listed in error messages.
    pub const ALL: [TransactionStatus; 3] = [
        TransactionStatus::Approved,
        TransactionStatus::Declined,
        TransactionStatus::Pending,
    ];

    /// The lowercase name used in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Approved => "approved",
            TransactionStatus::Declined => "declined",
            TransactionStatus::Pending => "pending",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = Error;

    /// Parse a status from its lowercase name.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] for the `status` field if `s` is not
    /// one of the known statuses.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                Error::Validation(vec![FieldError::new(
                    "status",
                    format!("'{s}' is not one of approved, declined, pending"),
                )])
            })
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for TransactionStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// The format used when writing timestamps, e.g. `2025-12-14T10:10:00.000000Z`.
///
/// A fixed number of subsecond digits keeps the stored text sortable.
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'_>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
);

/// A point in time in UTC, written as ISO-8601 with a `Z` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// The current time.
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Parse an RFC 3339 timestamp and convert it to UTC.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` is not a valid RFC 3339 timestamp.
    pub fn parse(text: &str) -> Result<Self, time::error::Parse> {
        OffsetDateTime::parse(text, &Rfc3339)
            .map(|date_time| Self(date_time.to_offset(UtcOffset::UTC)))
    }

    /// Format the timestamp with microsecond precision and a `Z` suffix.
    ///
    /// # Errors
    ///
    /// Returns an error if the year cannot be written with four digits.
    pub fn format(&self) -> Result<String, time::error::Format> {
        self.0.format(TIMESTAMP_FORMAT)
    }

    /// The underlying date-time.
    pub fn as_offset_date_time(&self) -> OffsetDateTime {
        self.0
    }
}

impl From<OffsetDateTime> for Timestamp {
    fn from(date_time: OffsetDateTime) -> Self {
        Self(date_time.to_offset(UtcOffset::UTC))
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let text = self.format().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.format()
            .map(ToSqlOutput::from)
            .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Timestamp::parse(value.as_str()?).map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A financial order record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID assigned by the database.
    pub id: TransactionId,
    /// The caller's identifier for the order, unique across transactions.
    pub order_id: String,
    /// The user who placed the order.
    pub user_id: String,
    /// The amount in cents, always between 1 and 1,000,000.
    pub amount_cents: i64,
    /// The outcome of the transaction.
    pub status: TransactionStatus,
    /// When the transaction was inserted.
    pub created_at: Timestamp,
}

/// The validated fields needed to insert a transaction.
///
/// Use [crate::transaction::NewTransactionPayload::validate] to build one from
/// a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// The caller's identifier for the order.
    pub order_id: String,
    /// The user who placed the order.
    pub user_id: String,
    /// The amount in cents.
    pub amount_cents: i64,
    /// The initial status.
    pub status: TransactionStatus,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "id, order_id, user_id, amount_cents, status, created_at";

/// Create the transactions table and its indexes in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id TEXT NOT NULL UNIQUE,
            user_id TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_transactions_user_id ON transactions(user_id);
        CREATE INDEX IF NOT EXISTS idx_transactions_status ON transactions(status);",
    )
}

/// Insert the demo transactions if the table has no rows.
///
/// Returns the number of inserted rows, which is zero if the table already had
/// data.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn seed_transactions_if_empty(connection: &Connection) -> Result<usize, Error> {
    if count_transactions(connection)? > 0 {
        return Ok(0);
    }

    let inserted = connection.execute(
        "INSERT INTO transactions (order_id, user_id, amount_cents, status, created_at) VALUES
            ('ORD-1001', 'U-001', 2599, 'approved', '2025-12-14T10:10:00.000000Z'),
            ('ORD-1002', 'U-002', 1099, 'pending',  '2025-12-14T10:12:00.000000Z'),
            ('ORD-1003', 'U-001', 499,  'declined', '2025-12-14T10:13:00.000000Z'),
            ('ORD-1004', 'U-003', 9999, 'approved', '2025-12-14T10:15:00.000000Z')",
        (),
    )?;

    tracing::info!(target: LOGGER_NAME, "seeded {inserted} demo transactions");

    Ok(inserted)
}

/// Create a new transaction in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateOrderId] if a transaction with the same order ID exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    new_transaction: &NewTransaction,
    created_at: Timestamp,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO transactions (order_id, user_id, amount_cents, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                &new_transaction.order_id,
                &new_transaction.user_id,
                new_transaction.amount_cents,
                new_transaction.status,
                created_at,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateOrderId(new_transaction.order_id.clone()),
            error => error.into(),
        })
}

/// Retrieve a transaction by its `order_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if no transaction has the order ID,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction_by_order_id(
    order_id: &str,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE order_id = :order_id"
        ))?
        .query_row(&[(":order_id", order_id)], map_transaction_row)?;

    Ok(transaction)
}

/// Get up to `limit` transactions for `user_id`, newest first.
///
/// As with SQLite's `LIMIT`, a negative `limit` returns every row.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_transactions_by_user(
    user_id: &str,
    limit: i64,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions
             WHERE user_id = ?1
             ORDER BY created_at DESC
             LIMIT ?2"
        ))?
        .query_map((user_id, limit), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Get the `limit` most recently created transactions, newest first.
///
/// As with SQLite's `LIMIT`, a negative `limit` returns every row.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_recent_transactions(
    limit: i64,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY created_at DESC LIMIT ?1"
        ))?
        .query_map([limit], map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Set the status of the transaction with `order_id` and return the updated row.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if no transaction has the order ID, in which case
///   nothing is changed,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction_status(
    order_id: &str,
    status: TransactionStatus,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let rows_affected = connection.execute(
        "UPDATE transactions SET status = ?1 WHERE order_id = ?2",
        (status, order_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_transaction_by_order_id(order_id, connection)
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM transactions", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Select from a table that does not exist.
///
/// This always fails and is used to rehearse incidents caused by broken
/// queries.
///
/// # Errors
/// Always returns an [Error::SqlError].
pub fn run_bad_query(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!("SELECT {TRANSACTION_COLUMNS} FROM not_a_real_table"))?
        .query_map([], map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Map a database row to a [Transaction].
///
/// The row must contain the columns id, order_id, user_id, amount_cents,
/// status and created_at, in that order.
///
/// # Errors
/// Returns an error if a column is missing or has the wrong type.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        order_id: row.get(1)?,
        user_id: row.get(2)?,
        amount_cents: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
    })
}
