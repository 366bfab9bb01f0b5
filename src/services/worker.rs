use {
    crate::domain::ids::PaymentId,
    std::{sync::Arc, time::Duration},
    tokio::sync::{mpsc, watch},
};

use super::reconciler::PaymentStatusReconciler;

const MAX_ATTEMPTS: u32 = 5;

/// One reconciliation unit of work, queued by the webhook receiver.
#[derive(Debug, Clone)]
pub struct ReconcileJob {
    pub payment_id: PaymentId,
    pub attempts: u32,
}

impl ReconcileJob {
    pub fn new(payment_id: PaymentId) -> Self {
        Self {
            payment_id,
            attempts: 0,
        }
    }
}

pub type JobSender = mpsc::UnboundedSender<ReconcileJob>;

pub fn job_channel() -> (JobSender, mpsc::UnboundedReceiver<ReconcileJob>) {
    mpsc::unbounded_channel()
}

/// Drain the reconcile queue. The webhook handler never blocks on
/// gateway I/O; all of it happens here. Transient failures are
/// re-enqueued with exponential backoff, terminal ones are logged and
/// dropped.
pub async fn run_worker(
    reconciler: Arc<PaymentStatusReconciler>,
    jobs: JobSender,
    mut rx: mpsc::UnboundedReceiver<ReconcileJob>,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!("reconcile worker started");

    loop {
        let job = tokio::select! {
            _ = shutdown.changed() => {
                tracing::info!("reconcile worker shutting down");
                return;
            }
            job = rx.recv() => match job {
                Some(job) => job,
                None => {
                    tracing::info!("job queue closed, reconcile worker stopping");
                    return;
                }
            },
        };

        let reconciler = reconciler.clone();
        let jobs = jobs.clone();
        tokio::spawn(async move {
            process_job(&reconciler, &jobs, job).await;
        });
    }
}

async fn process_job(
    reconciler: &PaymentStatusReconciler,
    jobs: &JobSender,
    job: ReconcileJob,
) {
    match reconciler.reconcile(&job.payment_id).await {
        Ok(outcome) => {
            tracing::info!(payment_id = %job.payment_id, ?outcome, "reconciled");
        }
        Err(e) if e.is_transient() && job.attempts + 1 < MAX_ATTEMPTS => {
            let attempts = job.attempts + 1;
            let delay = Duration::from_secs(2u64.pow(attempts));
            tracing::warn!(
                payment_id = %job.payment_id,
                attempts,
                error = %e,
                "transient failure, retrying with backoff"
            );
            let retry = ReconcileJob {
                payment_id: job.payment_id,
                attempts,
            };
            let jobs = jobs.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if jobs.send(retry).is_err() {
                    tracing::warn!("job queue closed, dropping retry");
                }
            });
        }
        Err(e) => {
            tracing::error!(
                payment_id = %job.payment_id,
                attempts = job.attempts,
                error = %e,
                "reconciliation failed permanently"
            );
        }
    }
}
