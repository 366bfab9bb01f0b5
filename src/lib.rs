pub mod adapters;
pub mod domain;
pub mod infra;
pub mod services;

use std::sync::Arc;

use services::{refunds::RefundService, worker::JobSender};

#[derive(Clone)]
pub struct AppState {
    pub jobs: JobSender,
    pub refunds: Arc<RefundService>,
}
