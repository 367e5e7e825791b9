//! Side-effecting operations: configuration, document lookup, report output.

pub mod config;
pub mod locator;
pub mod phases;
pub mod render;
pub mod report_store;
