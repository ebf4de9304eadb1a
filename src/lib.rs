//! Drive a licensed molecular-modeling suite over a directory of structures.
//!
//! Input files are split into one batch per worker, each batch runs its
//! commands one after another in a scratch directory, and the results are
//! gathered back up once every batch is done. Launching is gated on free
//! license seats and completion is detected through the sentinel files the
//! suite's job control leaves behind.

pub mod aggregate;
pub mod collect;
pub mod config;
pub mod error;
pub mod inp;
pub mod launcher;
pub mod license;
pub mod partition;
pub mod queue;
pub mod sentinel;
pub mod subjob;
pub mod suite;
pub mod utils;
pub mod wrapper;

pub use error::{Error, Result};
