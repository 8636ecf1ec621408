//! Metrics collection and export for paperbot.
//!
//! Crates record through the `metrics` facade macros re-exported here, using
//! the names in [`definitions`]. Without an installed recorder every call is a
//! no-op. The `prometheus` feature installs a Prometheus recorder whose
//! [`MetricsHandle::render`] output can be scraped or dumped.
//!
//! ```rust,ignore
//! use paperbot_metrics::{counter, labels, commands};
//!
//! counter!(commands::RECEIVED_TOTAL, labels::COMMAND => "search").increment(1);
//! ```

mod definitions;
mod recorder;

pub use {
    definitions::*,
    recorder::{MetricsHandle, MetricsRecorderConfig, init_metrics},
};

pub use metrics::{counter, gauge, histogram};
