//! Exit code constants for CLI commands
//!
//! - 0: Success, including a clean shutdown after Ctrl-C
//! - 1: Runtime failure such as a port that cannot be bound
//! - 2: Invalid configuration

/// Successful execution
pub const EXIT_SUCCESS: i32 = 0;

/// Runtime failure while starting or running the server
pub const EXIT_WARNING: i32 = 1;

/// Invalid configuration or arguments
pub const EXIT_ERROR: i32 = 2;
