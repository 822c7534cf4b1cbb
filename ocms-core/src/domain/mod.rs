//! Core domain types
//!
//! This module contains the domain structures shared between the cron service
//! (which produces them) and the client/CLI (which displays them).

pub mod batch_job;
pub mod job;
pub mod report;
pub mod step;
