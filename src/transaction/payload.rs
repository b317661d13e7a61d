//! Request payloads for creating and updating transactions and their validation.

use std::ops::RangeInclusive;

use serde::{Deserialize, Deserializer, de::Error as _};

use crate::{Error, error::FieldError};

use super::core::{NewTransaction, TransactionStatus};

/// The allowed number of characters in an order ID.
pub const ORDER_ID_LENGTH: RangeInclusive<usize> = 3..=50;
/// The allowed number of characters in a user ID.
pub const USER_ID_LENGTH: RangeInclusive<usize> = 2..=50;
/// The allowed amounts in cents.
pub const AMOUNT_CENTS_RANGE: RangeInclusive<i64> = 1..=1_000_000;

/// The JSON body for creating a transaction.
///
/// Fields are kept loose so that every problem can be reported at once by
/// [NewTransactionPayload::validate].
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransactionPayload {
    /// Between 3 and 50 characters.
    pub order_id: String,
    /// Between 2 and 50 characters.
    pub user_id: String,
    /// Between 1 and 1,000,000. Whole-valued floats such as `100.0` are
    /// accepted.
    #[serde(deserialize_with = "deserialize_whole_number")]
    pub amount_cents: i64,
    /// Defaults to pending when the key is missing. `Some(None)` is an
    /// explicit `null`, which is rejected.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub status: Option<Option<String>>,
}

impl NewTransactionPayload {
    /// Check every field and convert the payload into a [NewTransaction].
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] listing each invalid field.
    pub fn validate(self) -> Result<NewTransaction, Error> {
        let mut errors = Vec::new();

        check_length("order_id", &self.order_id, ORDER_ID_LENGTH, &mut errors);
        check_length("user_id", &self.user_id, USER_ID_LENGTH, &mut errors);

        if !AMOUNT_CENTS_RANGE.contains(&self.amount_cents) {
            errors.push(FieldError::new(
                "amount_cents",
                format!(
                    "must be between {} and {}",
                    AMOUNT_CENTS_RANGE.start(),
                    AMOUNT_CENTS_RANGE.end()
                ),
            ));
        }

        let status = match self.status {
            None => Some(TransactionStatus::default()),
            Some(None) => {
                errors.push(FieldError::new(
                    "status",
                    "must be one of approved, declined, pending, got null",
                ));
                None
            }
            Some(Some(status)) => parse_status(&status, &mut errors),
        };

        match status {
            Some(status) if errors.is_empty() => Ok(NewTransaction {
                order_id: self.order_id,
                user_id: self.user_id,
                amount_cents: self.amount_cents,
                status,
            }),
            _ => Err(Error::Validation(errors)),
        }
    }
}

/// The JSON body for updating the status of a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusPayload {
    /// One of approved, declined or pending.
    pub status: String,
}

impl UpdateStatusPayload {
    /// Parse the requested status.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if the status is unknown.
    pub fn validate(self) -> Result<TransactionStatus, Error> {
        self.status.parse()
    }
}

fn check_length(
    field: &str,
    value: &str,
    allowed: RangeInclusive<usize>,
    errors: &mut Vec<FieldError>,
) {
    let length = value.chars().count();

    if !allowed.contains(&length) {
        errors.push(FieldError::new(
            field,
            format!(
                "must have between {} and {} characters, got {length}",
                allowed.start(),
                allowed.end()
            ),
        ));
    }
}

/// Keep a key that is present but `null` apart from a missing key, which
/// `#[serde(default)]` turns into `None`.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn deserialize_whole_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Integer(i64),
        Float(f64),
    }

    match Number::deserialize(deserializer)? {
        Number::Integer(value) => Ok(value),
        Number::Float(value)
            if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 =>
        {
            Ok(value as i64)
        }
        Number::Float(value) => Err(D::Error::custom(format!(
            "amount_cents must be a whole number, got {value}"
        ))),
    }
}

fn parse_status(status: &str, errors: &mut Vec<FieldError>) -> Option<TransactionStatus> {
    match status.parse() {
        Ok(status) => Some(status),
        Err(Error::Validation(status_errors)) => {
            errors.extend(status_errors);
            None
        }
        Err(error) => {
            errors.push(FieldError::new("status", error.to_string()));
            None
        }
    }
}
