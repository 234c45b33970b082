//! Metric collection from the running system.

pub mod cpu;
