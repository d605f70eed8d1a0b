//! HTTP request handlers for Session Gateway.

pub mod health;
pub mod metrics;
pub mod session;

pub use health::health_check;
pub use metrics::metrics_handler;
pub use session::create_session;
