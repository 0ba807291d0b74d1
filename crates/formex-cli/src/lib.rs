//! CLI library components for the survey exporter.

pub mod logging;
