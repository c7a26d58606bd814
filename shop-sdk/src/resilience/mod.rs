//! Resilience patterns for upstream calls
//!
//! Every outbound call the gateway makes goes through [`RetryExecutor`]:
//! bounded attempts, exponential backoff between them, and an optional
//! caller deadline that stops further attempts.

mod retry;

pub use retry::{RetryExecutor, RetryPolicy};
