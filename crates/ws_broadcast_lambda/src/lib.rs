//! AWS-oriented adapters and handlers for WebSocket broadcast delivery.
//!
//! This crate owns runtime integration details (Lambda handlers, DynamoDB,
//! SQS and API Gateway Management adapters, configuration and logging).
//! Paging, aggregation and fan-out semantics live in `ws_broadcast_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod telemetry;
