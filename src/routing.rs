//! Application router configuration.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::json;

use crate::{
    AppState,
    diagnostics::{get_bad_query, get_fail, get_health, get_timeout},
    endpoints,
    logging::add_request_logging,
    transaction::{
        create_transaction_endpoint, get_recent_transactions_endpoint,
        get_transaction_by_order_endpoint, get_transactions_by_user_endpoint,
        search_transactions_endpoint, update_transaction_status_endpoint,
    },
};

/// Return a router with all the app's routes, wrapped in the request logger.
pub fn build_router(state: AppState) -> Router {
    let diagnostic_routes = Router::new()
        .route(endpoints::ROOT, get(get_health))
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::FAIL, get(get_fail))
        .route(endpoints::TIMEOUT, get(get_timeout))
        .route(endpoints::BAD_QUERY, get(get_bad_query));

    let transaction_routes = Router::new()
        .route(endpoints::TRANSACTIONS, post(create_transaction_endpoint))
        .route(
            endpoints::RECENT_TRANSACTIONS,
            get(get_recent_transactions_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS_BY_USER,
            get(get_transactions_by_user_endpoint),
        )
        .route(
            endpoints::TRANSACTION_BY_ORDER,
            get(get_transaction_by_order_endpoint),
        )
        .route(
            endpoints::SEARCH_TRANSACTIONS,
            get(search_transactions_endpoint),
        )
        .route(
            endpoints::TRANSACTION_STATUS,
            put(update_transaction_status_endpoint),
        );

    let router = diagnostic_routes
        .merge(transaction_routes)
        .fallback(get_404_not_found)
        .with_state(state);

    add_request_logging(router)
}

async fn get_404_not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" }))).into_response()
}
