//! OCMS Cron
//!
//! Tracked batch job execution: the job template, the gated step pipeline,
//! audit recording, distributed locking, cron scheduling and the HTTP API
//! used to monitor and trigger jobs.

pub mod api;
pub mod config;
pub mod db;
pub mod job;
pub mod jobs;
pub mod lock;
pub mod pipeline;
pub mod recorder;
pub mod scheduler;
pub mod service;
