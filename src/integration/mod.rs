//! Integration testing module
//!
//! End-to-end tests for the control server:
//! - Router-level request/response checks
//! - Structured configuration errors on the wire
//! - Job start/stop lifecycle over a real socket

pub mod e2e;
pub mod fixtures;
pub mod router;
