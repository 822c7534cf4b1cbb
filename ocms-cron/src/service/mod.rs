//! Service Module
//!
//! Business logic built on top of the recorder.

pub mod report;

// Re-export for convenience
pub use report as report_service;
pub use report::{JobExecutionReportService, ReportSettings};
