//! Structured request logging.
//!
//! Every request gets a request ID, either the one supplied by the client in
//! the `x-request-id` header or a fresh UUID. The ID is echoed back on the
//! response and attached to exactly one JSON log line per request.
//!
//! Internal faults ([UnhandledError] responses and panics) are logged at the
//! error level and turned into a generic 500 response that only exposes the
//! request ID.

use std::{
    any::Any,
    io::{self, Write},
    net::SocketAddr,
    time::Instant,
};

use axum::{
    Json, Router,
    extract::{ConnectInfo, Request},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
};
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter,
    fmt::{MakeWriter, time::UtcTime},
};

use crate::error::UnhandledError;

/// The name attached to every log line as its `target`.
pub const LOGGER_NAME: &str = "ops_api";

/// The header carrying the request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Wrap `router` with request ID handling, panic catching and request logging.
///
/// Layers run outermost first: the request ID is assigned, then the logging
/// middleware times the request, then panics from handlers are caught.
pub fn add_request_logging(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Log the outcome of each request as a single event.
///
/// Responses marked with [UnhandledError] are logged as `unhandled_exception`
/// at the error level and replaced by a generic 500 response. All other
/// responses are logged as `request_completed` at the info level.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|request_id| {
            String::from_utf8_lossy(request_id.header_value().as_bytes()).into_owned()
        })
        .unwrap_or_else(|| "-".to_owned());
    let method = request.method().to_string();
    let path = request.uri().path().to_owned();
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(address)| address.ip().to_string());
    let start = Instant::now();

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_millis() as u64;

    match response.extensions().get::<UnhandledError>() {
        Some(error) => {
            tracing::error!(
                target: LOGGER_NAME,
                request_id = %request_id,
                method = %method,
                path = %path,
                status_code = StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                duration_ms,
                client_ip = client_ip.as_deref(),
                error_type = error.kind,
                error = %error.detail,
                "unhandled_exception"
            );

            internal_server_error_response(&request_id)
        }
        None => {
            tracing::info!(
                target: LOGGER_NAME,
                request_id = %request_id,
                method = %method,
                path = %path,
                status_code = response.status().as_u16(),
                duration_ms,
                client_ip = client_ip.as_deref(),
                "request_completed"
            );

            response
        }
    }
}

fn internal_server_error_response(request_id: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "detail": "Internal Server Error",
            "request_id": request_id,
        })),
    )
        .into_response()
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else {
        "panic with a non-string payload".to_owned()
    };

    UnhandledError {
        kind: "Panic",
        detail,
    }
    .into_response()
}

/// Build the JSON log subscriber.
///
/// Each event is written as one line with the keys `timestamp` (RFC 3339,
/// UTC), `level`, `target`, `message` and the event's fields.
pub fn json_subscriber<W>(make_writer: W, filter: EnvFilter) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_timer(UtcTime::rfc_3339())
        .with_env_filter(filter)
        .with_writer(make_writer)
        .finish()
}

/// A writer that reports success when the reader on the other end has gone away.
///
/// Log lines are dropped once the pipe is closed, e.g. when stdout was piped
/// into `tee` and that process stopped. Requests keep being served.
#[derive(Debug)]
pub struct PipeTolerantWriter<W>(W);

impl<W> PipeTolerantWriter<W> {
    /// Wrap `inner`.
    pub fn new(inner: W) -> Self {
        Self(inner)
    }
}

impl<W: Write> Write for PipeTolerantWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.0.write(buf) {
            Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(buf.len()),
            result => result,
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.0.flush() {
            Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            result => result,
        }
    }
}

/// A [MakeWriter] for stdout that tolerates a closed pipe.
pub fn pipe_tolerant_stdout() -> impl for<'writer> MakeWriter<'writer> + Send + Sync + 'static {
    || PipeTolerantWriter::new(io::stdout())
}


#[cfg(test)]
mod middleware_tests {
    use axum::{
        Router,
        http::{HeaderName, HeaderValue, StatusCode},
        routing::get,
    };
    use axum_test::TestServer;
    use serde_json::Value;
    use tracing_subscriber::EnvFilter;

    use crate::{Error, test_utils::LogBuffer};

    use super::{REQUEST_ID_HEADER, add_request_logging, json_subscriber};

    async fn ok_handler() -> &'static str {
        "ok"
    }

    async fn failing_handler() -> Result<&'static str, Error> {
        Err(Error::SimulatedFailure)
    }

    async fn panicking_handler() -> &'static str {
        panic!("handler exploded")
    }

    async fn not_found_handler() -> Result<&'static str, Error> {
        Err(Error::NotFound)
    }

    fn get_test_server() -> TestServer {
        let router = Router::new()
            .route("/ok", get(ok_handler))
            .route("/fail", get(failing_handler))
            .route("/panic", get(panicking_handler))
            .route("/missing", get(not_found_handler));

        TestServer::try_new(add_request_logging(router)).expect("Could not create test server.")
    }

    fn request_id_of(response: &axum_test::TestResponse) -> String {
        response
            .headers()
            .get(REQUEST_ID_HEADER)
            .expect("x-request-id header missing")
            .to_str()
            .expect("Could not convert to str")
            .to_owned()
    }

    #[tokio::test]
    async fn generates_request_id() {
        let server = get_test_server();

        let response = server.get("/ok").await;

        response.assert_status_ok();
        let request_id = request_id_of(&response);
        assert_eq!(request_id.len(), 36, "want a UUID, got {request_id}");
    }

    #[tokio::test]
    async fn generated_request_ids_differ() {
        let server = get_test_server();

        let first = request_id_of(&server.get("/ok").await);
        let second = request_id_of(&server.get("/ok").await);

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn reuses_supplied_request_id() {
        let server = get_test_server();

        let response = server
            .get("/ok")
            .add_header(
                HeaderName::from_static(REQUEST_ID_HEADER),
                HeaderValue::from_static("incident-42"),
            )
            .await;

        assert_eq!(request_id_of(&response), "incident-42");
    }

    #[tokio::test]
    async fn non_ascii_request_id_still_reaches_the_body() {
        let server = get_test_server();

        let response = server
            .get("/fail")
            .add_header(
                HeaderName::from_static(REQUEST_ID_HEADER),
                HeaderValue::from_bytes(b"inc\xe9-1").unwrap(),
            )
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER).unwrap().as_bytes(),
            b"inc\xe9-1"
        );
        assert_eq!(response.json::<Value>()["request_id"], "inc\u{FFFD}-1");
    }

    #[tokio::test]
    async fn unhandled_error_becomes_generic_500() {
        let server = get_test_server();

        let response = server.get("/fail").await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let request_id = request_id_of(&response);
        let body = response.json::<Value>();
        assert_eq!(body["detail"], "Internal Server Error");
        assert_eq!(body["request_id"], request_id.as_str());
        assert!(!response.text().contains("simulated"));
    }

    #[tokio::test]
    async fn panic_becomes_generic_500() {
        let server = get_test_server();

        let response = server.get("/panic").await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let request_id = request_id_of(&response);
        let body = response.json::<Value>();
        assert_eq!(body["request_id"], request_id.as_str());
        assert!(!response.text().contains("exploded"));
    }

    #[tokio::test]
    async fn handled_errors_pass_through() {
        let server = get_test_server();

        let response = server.get("/missing").await;

        response.assert_status_not_found();
        assert_eq!(response.json::<Value>()["detail"], "Not found");
        request_id_of(&response);
    }

    #[tokio::test]
    async fn logs_one_line_per_request() {
        let buffer = LogBuffer::default();
        let _guard = tracing::subscriber::set_default(json_subscriber(
            buffer.make_writer(),
            EnvFilter::new("info"),
        ));
        let server = get_test_server();

        let ok_id = request_id_of(&server.get("/ok").await);
        let fail_id = request_id_of(&server.get("/fail").await);

        let lines = buffer.json_lines();
        let request_lines: Vec<_> = lines
            .iter()
            .filter(|line| line["request_id"].is_string())
            .collect();
        assert_eq!(request_lines.len(), 2, "got log lines {lines:?}");

        let completed = request_lines[0];
        assert_eq!(completed["message"], "request_completed");
        assert_eq!(completed["level"], "INFO");
        assert_eq!(completed["target"], "ops_api");
        assert_eq!(completed["request_id"], ok_id.as_str());
        assert_eq!(completed["method"], "GET");
        assert_eq!(completed["path"], "/ok");
        assert_eq!(completed["status_code"], 200);
        assert!(completed["duration_ms"].is_u64());
        assert!(completed["timestamp"].as_str().unwrap().ends_with('Z'));

        let failed = request_lines[1];
        assert_eq!(failed["message"], "unhandled_exception");
        assert_eq!(failed["level"], "ERROR");
        assert_eq!(failed["request_id"], fail_id.as_str());
        assert_eq!(failed["status_code"], 500);
        assert_eq!(failed["error_type"], "SimulatedFailure");
    }
}
