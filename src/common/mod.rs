//! Common types shared across the harness

pub mod cancel;
pub mod config;
pub mod error;
pub mod logging;
pub mod retry;

pub use cancel::{cancel_pair, CancelHandle, CancelToken};
pub use config::Config;
pub use error::{Error, Result};
pub use retry::RetryPolicy;
