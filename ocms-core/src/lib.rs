//! OCMS Core
//!
//! Core types and abstractions for the OCMS batch job service.
//!
//! This crate contains:
//! - Domain types: job results and status, pipeline step results, batch job
//!   audit records and the job execution report
//! - DTOs: Data transfer objects exchanged between the service and its clients

pub mod domain;
pub mod dto;
