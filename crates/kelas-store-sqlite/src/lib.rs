//! SQLite backend for the Kelas class store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. The schema's partial unique
//! indexes are the storage-layer backstop for the singularity invariants;
//! grant replacement runs inside a single rusqlite transaction.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
