//! Observability module for Session Gateway.
//!
//! Provides metrics definitions and recording helpers.

pub mod metrics;
