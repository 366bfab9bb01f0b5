mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    routing::post,
};
use common::*;
use give_sync::AppState;
use give_sync::adapters::http::{refund_handler, webhook_handler};
use give_sync::domain::ids::PaymentId;
use give_sync::domain::transaction::{Mode, SequenceType, Transaction, TransactionStatus};
use give_sync::services::refunds::RefundService;
use give_sync::services::worker::{ReconcileJob, job_channel};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceExt;

fn make_app(
    store: Arc<MemoryStore>,
    gateway: Arc<MockGateway>,
) -> (Router, mpsc::UnboundedReceiver<ReconcileJob>) {
    let (jobs, rx) = job_channel();
    let state = AppState {
        jobs,
        refunds: Arc::new(RefundService::new(store, gateway)),
    };
    let app = Router::new()
        .route("/payment/webhook", post(webhook_handler))
        .route("/payment/refund", post(refund_handler))
        .with_state(state);
    (app, rx)
}

fn webhook_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/payment/webhook")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn valid_webhook_acks_and_enqueues() {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(MockGateway::new());
    let (app, mut rx) = make_app(store, gateway);

    let response = app.oneshot(webhook_request("id=tr_hook1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["id"], "tr_hook1");

    let job = rx.try_recv().unwrap();
    assert_eq!(job.payment_id, PaymentId::new("tr_hook1").unwrap());
    assert_eq!(job.attempts, 0);
}

#[tokio::test]
async fn malformed_payment_id_still_gets_200() {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(MockGateway::new());
    let (app, mut rx) = make_app(store, gateway);

    let response = app
        .oneshot(webhook_request("id=not-a-payment-id"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);

    // Nothing to process.
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn unknown_but_wellformed_id_is_enqueued() {
    // Whether the payment exists is the worker's problem; the endpoint
    // never leaks existence to the caller.
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(MockGateway::new());
    let (app, mut rx) = make_app(store, gateway);

    let response = app.oneshot(webhook_request("id=tr_nosuch")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(rx.try_recv().is_ok());
}

#[tokio::test]
async fn closed_queue_surfaces_as_server_error() {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(MockGateway::new());
    let (app, rx) = make_app(store, gateway);
    drop(rx);

    let response = app.oneshot(webhook_request("id=tr_hook2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn refund_endpoint_reports_gateway_outcome() {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(MockGateway::new());

    let mut tx = Transaction::new(eur("15.00"), SequenceType::Oneoff, Mode::Test);
    tx.status = Some(TransactionStatus::Paid);
    tx.vendor_payment_id = Some(PaymentId::new("tr_ref_api").unwrap());
    let tx_id = store.seed_transaction(tx);

    let (app, _rx) = make_app(store, gateway.clone());
    let request = Request::builder()
        .method("POST")
        .uri("/payment/refund")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(format!("{{\"transactionId\":\"{tx_id}\"}}")))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);
    assert_eq!(gateway.refund_calls.lock().unwrap().len(), 1);
}
