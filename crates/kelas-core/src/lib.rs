//! Core types and trait definitions for the Kelas class-management system.
//!
//! This crate holds the privilege model: the role enumerations, the
//! `ClassStore` abstraction, the authorization engine, and the privilege
//! assignment protocol. It is deliberately free of HTTP and database
//! dependencies; all other crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod assign;
pub mod engine;
pub mod error;
pub mod grant;
pub mod id;
pub mod record;
pub mod role;
pub mod store;

pub use engine::Engine;
pub use error::{Error, Result};
