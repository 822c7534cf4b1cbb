//! Data Transfer Objects for service communication
//!
//! This module contains the request and response bodies of the cron service
//! HTTP API. Domain types are embedded as-is where they already serialize to
//! the wire shape.

pub mod job;
