//! Observability utilities for the contents layer.
//!
//! Structured events go through `tracing`; the [`Logger`] additionally keeps a
//! markdown activity log of operations, checkpoints and failures.
//!
//! # Example
//!
//! ```no_run
//! use nbvault::observability::Logger;
//!
//! let logger = Logger::new(None, Some("DEBUG")).unwrap();
//! logger.log_operation("save", "a/b.ipynb").unwrap();
//! logger.log_checkpoint("created", "a/b.ipynb", "0").unwrap();
//! ```

pub mod logger;

// Re-export main types for convenience
pub use logger::Logger;
