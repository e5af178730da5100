//! Logging setup.
//!
//! The crate logs through the `log` facade; `env_logger` is the backend the
//! runtime installs.

mod init;

pub use init::{LoggingConfig, init_logging};
