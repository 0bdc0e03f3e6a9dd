//! Shared WebSocket broadcast domain primitives.
//!
//! This crate owns connection paging, aggregation, fan-out delivery and the
//! error model. It intentionally excludes AWS SDK and Lambda runtime concerns;
//! those live in `ws_broadcast_lambda` behind the traits declared here.

pub mod aggregate;
pub mod contract;
pub mod dispatch;
pub mod error;
pub mod pager;
pub mod queue;
pub mod store;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;
