pub mod http;
pub mod mollie;
