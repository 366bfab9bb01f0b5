pub mod donors;
pub mod lock;
pub mod mandate;
pub mod provisioner;
pub mod reconciler;
pub mod refunds;
pub mod worker;
