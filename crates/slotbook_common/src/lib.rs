// --- File: crates/slotbook_common/src/lib.rs ---

// Declare modules within this crate
pub mod error;    // Error handling
pub mod http;     // HTTP client construction
pub mod logging;  // Logging utilities
pub mod services; // Async seams shared by service crates

// Re-export error types and utilities for easier access
pub use error::{config_error, internal_error, Context, SlotbookError};

// Re-export HTTP utilities for easier access
pub use http::{client_for_backend, create_client};

// Re-export logging utilities for easier access
pub use logging::{init_from_config, log_result};

pub use services::BoxFuture;

// This crate provides functionality shared by the booking core and the terminal front end:
// the common error type, tracing setup and the reqwest client factory.
