mod common;

use common::*;
use give_sync::domain::ids::PaymentId;
use give_sync::domain::transaction::{Mode, SequenceType, Transaction, TransactionStatus};
use give_sync::services::worker::{ReconcileJob, job_channel, run_worker};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::watch;

async fn wait_until(deadline: Duration, mut check: impl FnMut() -> bool) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn worker_drains_queue_and_stops_on_shutdown() {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(MockGateway::new());
    let reconciler = Arc::new(make_reconciler(store.clone(), gateway.clone()));

    let tx_id = store.seed_transaction(Transaction::new(
        eur("10.00"),
        SequenceType::Oneoff,
        Mode::Test,
    ));
    let mut payment = make_payment("tr_worker", TransactionStatus::Paid, SequenceType::Oneoff);
    payment.metadata.transaction_id = Some(tx_id);
    gateway.put_payment(payment);

    let (jobs, rx) = job_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = tokio::spawn(run_worker(reconciler, jobs.clone(), rx, shutdown_rx));

    jobs.send(ReconcileJob::new(PaymentId::new("tr_worker").unwrap()))
        .unwrap();

    let settled = wait_until(Duration::from_secs(5), || {
        store.transaction(tx_id).status == Some(TransactionStatus::Paid)
    })
    .await;
    assert!(settled, "worker never processed the job");

    shutdown_tx.send(true).unwrap();
    worker.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn transient_failure_is_retried_until_the_gateway_recovers() {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(MockGateway::new());
    let reconciler = Arc::new(make_reconciler(store.clone(), gateway.clone()));

    let tx_id = store.seed_transaction(Transaction::new(
        eur("10.00"),
        SequenceType::Oneoff,
        Mode::Test,
    ));
    let mut payment = make_payment("tr_flaky", TransactionStatus::Paid, SequenceType::Oneoff);
    payment.metadata.transaction_id = Some(tx_id);
    gateway.put_payment(payment);
    gateway.fail_get_payment.store(true, Ordering::SeqCst);

    let (jobs, rx) = job_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = tokio::spawn(run_worker(reconciler, jobs.clone(), rx, shutdown_rx));

    jobs.send(ReconcileJob::new(PaymentId::new("tr_flaky").unwrap()))
        .unwrap();

    // First attempt fails; the retry lands after the gateway comes back.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(store.transaction(tx_id).status, None);
    gateway.fail_get_payment.store(false, Ordering::SeqCst);

    let settled = wait_until(Duration::from_secs(10), || {
        store.transaction(tx_id).status == Some(TransactionStatus::Paid)
    })
    .await;
    assert!(settled, "retry never reconciled the payment");

    shutdown_tx.send(true).unwrap();
    worker.await.unwrap();
}
