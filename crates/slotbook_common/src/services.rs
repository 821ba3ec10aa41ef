// --- File: crates/slotbook_common/src/services.rs ---
//! Async seams shared by service crates.
//!
//! Service traits return boxed futures so they stay object safe and can be
//! swapped for in-memory doubles in tests.

use std::future::Future;
use std::pin::Pin;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;
