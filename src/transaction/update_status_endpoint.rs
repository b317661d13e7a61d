//! Defines the endpoint for changing the status of a transaction.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    Error,
    db::Database,
    extract::ValidJson,
    transaction::{Transaction, UpdateStatusPayload, core::update_transaction_status},
};

/// A route handler for setting the status of the transaction with the order
/// ID in the path.
///
/// Responds with the updated row, 422 for an unknown status, or 404 if no
/// transaction has the order ID.
pub async fn update_transaction_status_endpoint(
    State(database): State<Database>,
    Path(order_id): Path<String>,
    ValidJson(payload): ValidJson<UpdateStatusPayload>,
) -> Result<Json<Transaction>, Error> {
    let status = payload.validate()?;

    let connection = database.connect()?;
    let transaction = update_transaction_status(&order_id, status, &connection)?;

    Ok(Json(transaction))
}

#[cfg(test)]
mod update_status_endpoint_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{TestDatabase, get_test_server},
        transaction::{TransactionStatus, core::get_transaction_by_order_id},
    };

    #[tokio::test]
    async fn can_update_status() {
        let db = TestDatabase::seeded();
        let server = get_test_server(&db);

        let response = server
            .put(&format_endpoint(endpoints::TRANSACTION_STATUS, "ORD-1002"))
            .json(&json!({ "status": "declined" }))
            .await;

        response.assert_status_ok();
        let updated = response.json::<Value>();
        assert_eq!(updated["order_id"], "ORD-1002");
        assert_eq!(updated["status"], "declined");

        let fetched = server
            .get(&format_endpoint(endpoints::TRANSACTION_BY_ORDER, "ORD-1002"))
            .await
            .json::<Value>();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn unknown_order_is_404_and_changes_nothing() {
        let db = TestDatabase::seeded();
        let server = get_test_server(&db);
        let connection = db.connect();
        let before = get_transaction_by_order_id("ORD-1002", &connection).unwrap();

        let response = server
            .put(&format_endpoint(endpoints::TRANSACTION_STATUS, "ORD-9999"))
            .json(&json!({ "status": "approved" }))
            .await;

        response.assert_status_not_found();
        assert_eq!(response.json::<Value>(), json!({ "detail": "Not found" }));
        let after = get_transaction_by_order_id("ORD-1002", &connection).unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn unknown_status_is_rejected() {
        let db = TestDatabase::seeded();
        let server = get_test_server(&db);

        let response = server
            .put(&format_endpoint(endpoints::TRANSACTION_STATUS, "ORD-1002"))
            .json(&json!({ "status": "APPROVED" }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<Value>()["detail"][0]["field"], "status");
        let unchanged = get_transaction_by_order_id("ORD-1002", &db.connect()).unwrap();
        assert_eq!(unchanged.status, TransactionStatus::Pending);
    }
}
