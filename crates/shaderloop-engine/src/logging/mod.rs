//! Logger setup for binaries and tests. The engine itself only uses the `log`
//! macros.

mod init;

pub use init::{DEFAULT_FILTER, LoggingConfig, init_logging};
