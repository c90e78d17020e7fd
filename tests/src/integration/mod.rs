//! End-to-end update-status flows.

pub mod apply_time_flows;
pub mod bulk_queue_flows;
pub mod concurrency;
