pub mod campaign;
pub mod donor;
pub mod error;
pub mod event;
pub mod gateway;
pub mod ids;
pub mod interval;
pub mod money;
pub mod store;
pub mod subscription;
pub mod transaction;
