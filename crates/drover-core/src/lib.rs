//! Core types and trait definitions for the Drover campaign engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod campaign;
pub mod contact;
pub mod error;
pub mod recipient;
pub mod store;
pub mod token;
pub mod transport;

pub use error::{Error, Result};
