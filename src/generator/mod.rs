//! Synthetic load generators

pub mod statsd;
