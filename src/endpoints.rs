//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/transactions/by-order/{order_id}',
//! use [format_endpoint].

/// The root route, an alias for the health check.
pub const ROOT: &str = "/";
/// The liveness check.
pub const HEALTH: &str = "/health";
/// Always fails with an internal server error.
pub const FAIL: &str = "/fail";
/// Sleeps for the number of seconds given in the query string.
pub const TIMEOUT: &str = "/timeout";
/// The route for creating transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The most recently created transactions.
pub const RECENT_TRANSACTIONS: &str = "/transactions/recent";
/// The transactions belonging to a user.
pub const TRANSACTIONS_BY_USER: &str = "/transactions/by-user/{user_id}";
/// A single transaction looked up by its order ID.
pub const TRANSACTION_BY_ORDER: &str = "/transactions/by-order/{order_id}";
/// Filtered list of transactions.
pub const SEARCH_TRANSACTIONS: &str = "/transactions/search";
/// The route to update the status of a transaction.
pub const TRANSACTION_STATUS: &str = "/transactions/{order_id}/status";
/// Runs a query against a table that does not exist.
pub const BAD_QUERY: &str = "/transactions/bad-query";

/// Replace the parameter in `endpoint_path` with `value`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/transactions/by-user/{user_id}',
/// '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, value: &str) -> String {
    let param_start = match endpoint_path.find('{') {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        value,
        &endpoint_path[param_end..]
    )
}
