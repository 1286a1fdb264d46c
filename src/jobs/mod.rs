//! Background jobs executed by the scheduler.
//!
//! Jobs are fault-contained: a failed run is logged and the scheduler keeps
//! its cadence; nothing is retried within a run.

pub mod daily_report_job;
