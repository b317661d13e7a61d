//! Defines the app level error type and its conversion to JSON responses.
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

/// A problem with a single field of a request payload or query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// The name of the offending field, or `body`/`query` when the whole input
    /// could not be parsed.
    pub field: String,
    /// A human readable description of what is wrong with the field.
    pub message: String,
}

impl FieldError {
    /// Create a new field error.
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_owned(),
            message: message.into(),
        }
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One or more fields in the request failed validation.
    #[error("validation failed: {0:?}")]
    Validation(Vec<FieldError>),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows or an
    /// update does not affect any rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A transaction with the given order ID already exists in the database.
    #[error("order_id '{0}' already exists")]
    DuplicateOrderId(String),

    /// The failure raised on purpose by the `/fail` endpoint.
    #[error("simulated failure")]
    SimulatedFailure,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl Error {
    /// The name of the error variant, used as the `error_type` in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "Validation",
            Error::NotFound => "NotFound",
            Error::DuplicateOrderId(_) => "DuplicateOrderId",
            Error::SimulatedFailure => "SimulatedFailure",
            Error::SqlError(_) => "SqlError",
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => Error::SqlError(error),
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(vec![FieldError::new("body", rejection.body_text())])
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::Validation(vec![FieldError::new("query", rejection.body_text())])
    }
}

/// Marks a response as the result of an internal fault.
///
/// The request logging middleware looks for this extension, logs the failure
/// at the error level and replaces the response body with a generic message
/// and the request ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnhandledError {
    /// The kind of error, e.g. `SqlError`.
    pub kind: &'static str,
    /// Details for the server logs. Never sent to the client.
    pub detail: String,
}

impl IntoResponse for UnhandledError {
    fn into_response(self) -> Response {
        let mut response = (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "Internal Server Error" })),
        )
            .into_response();
        response.extensions_mut().insert(self);

        response
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": errors })),
            )
                .into_response(),
            Error::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found" }))).into_response()
            }
            Error::DuplicateOrderId(order_id) => (
                StatusCode::CONFLICT,
                Json(json!({ "detail": format!("order_id '{order_id}' already exists") })),
            )
                .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => UnhandledError {
                kind: error.kind(),
                detail: error.to_string(),
            }
            .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::{Error, FieldError, UnhandledError};

    #[test]
    fn no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert!(matches!(error, Error::NotFound));
    }

    #[test]
    fn other_sql_errors_are_kept() {
        let error: Error = rusqlite::Error::InvalidQuery.into();

        assert!(matches!(error, Error::SqlError(_)));
        assert_eq!(error.kind(), "SqlError");
    }

    #[test]
    fn validation_is_unprocessable() {
        let response =
            Error::Validation(vec![FieldError::new("amount_cents", "too small")]).into_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.extensions().get::<UnhandledError>().is_none());
    }

    #[test]
    fn duplicate_order_id_is_conflict() {
        let response = Error::DuplicateOrderId("ORD-1".to_owned()).into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn internal_errors_are_marked_unhandled() {
        let response = Error::SimulatedFailure.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let marker = response
            .extensions()
            .get::<UnhandledError>()
            .expect("missing unhandled error marker");
        assert_eq!(marker.kind, "SimulatedFailure");
        assert_eq!(marker.detail, "simulated failure");
    }
}
