//! Extractors that report malformed input as validation errors.
//!
//! The plain axum extractors answer with plain text and a mix of 400 and 422
//! status codes. These wrappers route the rejection through [Error] so that
//! every input problem produces the same JSON 422 response.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query},
};

use crate::Error;

/// Like [axum::Json], but rejections become [Error::Validation].
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(Error))]
pub struct ValidJson<T>(pub T);

/// Like [axum::extract::Query], but rejections become [Error::Validation].
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(Error))]
pub struct ValidQuery<T>(pub T);
