//! Filtered transaction search.
//!
//! The WHERE clause is assembled from whichever filters are set. Values are
//! always bound as positional parameters; only the fixed column conditions
//! are written into the SQL text.

use rusqlite::{Connection, ToSql, params_from_iter};

use crate::Error;

use super::core::{Transaction, map_transaction_row};

/// The default number of rows returned by a search.
pub const DEFAULT_SEARCH_LIMIT: i64 = 50;

/// The optional filters for [search_transactions].
///
/// Unset filters do not restrict the results. Amount bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Only include transactions with this status.
    ///
    /// Compared as text, so a value that is not a known status matches no rows.
    pub status: Option<String>,
    /// Only include transactions for this user.
    pub user_id: Option<String>,
    /// Only include transactions of at least this many cents.
    pub min_amount_cents: Option<i64>,
    /// Only include transactions of at most this many cents.
    pub max_amount_cents: Option<i64>,
    /// The maximum number of rows to return. A negative limit returns every
    /// matching row.
    pub limit: i64,
}

impl Default for TransactionFilter {
    fn default() -> Self {
        Self {
            status: None,
            user_id: None,
            min_amount_cents: None,
            max_amount_cents: None,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

/// Collects WHERE conditions together with the values bound to them.
#[derive(Default)]
pub(crate) struct WhereClauseBuilder {
    clauses: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl WhereClauseBuilder {
    /// Add the condition `{condition} ?N`, binding `value` to the new parameter.
    ///
    /// `condition` must be a column followed by a comparison operator, e.g.
    /// `"amount_cents >="`. It must never contain caller supplied text.
    pub(crate) fn push(&mut self, condition: &'static str, value: impl ToSql + 'static) {
        self.params.push(Box::new(value));
        self.clauses.push(format!("{condition} ?{}", self.params.len()));
    }

    /// Bind one more value that is not part of the WHERE clause, e.g. a limit,
    /// and return its placeholder.
    pub(crate) fn bind(&mut self, value: impl ToSql + 'static) -> String {
        self.params.push(Box::new(value));
        format!("?{}", self.params.len())
    }

    /// The WHERE clause including a leading space, or an empty string when no
    /// conditions were added.
    pub(crate) fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    /// The values in the order of their placeholders.
    pub(crate) fn params(&self) -> &[Box<dyn ToSql>] {
        &self.params
    }
}

/// Build the SQL and bound values for `filter`.
pub(crate) fn build_search_query(filter: &TransactionFilter) -> (String, WhereClauseBuilder) {
    let mut builder = WhereClauseBuilder::default();

    if let Some(status) = &filter.status {
        builder.push("status =", status.clone());
    }
    if let Some(user_id) = &filter.user_id {
        builder.push("user_id =", user_id.clone());
    }
    if let Some(min_amount_cents) = filter.min_amount_cents {
        builder.push("amount_cents >=", min_amount_cents);
    }
    if let Some(max_amount_cents) = filter.max_amount_cents {
        builder.push("amount_cents <=", max_amount_cents);
    }

    let where_clause = builder.where_clause();
    let limit = builder.bind(filter.limit);
    let query = format!(
        "SELECT id, order_id, user_id, amount_cents, status, created_at FROM transactions\
        {where_clause} ORDER BY created_at DESC LIMIT {limit}"
    );

    (query, builder)
}

/// Get the transactions matching `filter`, newest first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn search_transactions(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let (query, builder) = build_search_query(filter);

    connection
        .prepare(&query)?
        .query_map(params_from_iter(builder.params()), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}
