//! Error types for `kelas-core`.
//!
//! Query paths never produce permission errors — they are total and return
//! `false`/`None`/empty for missing data. The variants below surface only
//! from the assignment protocol, except [`Error::Store`], which wraps an
//! infrastructure failure from the backend and may surface anywhere.

use thiserror::Error;

use crate::id::{ClassId, UserId};

#[derive(Debug, Error)]
pub enum Error {
  /// No acting identity could be resolved.
  #[error("no acting identity resolved")]
  Unauthorized,

  /// The actor is known but lacks the capability for this operation.
  #[error("user {actor} lacks the required capability in class {class}")]
  Forbidden { actor: UserId, class: ClassId },

  /// The target user has no active enrollment in the class.
  #[error("user {user} has no active enrollment in class {class}")]
  NotEnrolled { user: UserId, class: ClassId },

  /// The instructor grant already exists; nothing was written.
  #[error("user {user} already holds that role in class {class}")]
  DuplicateGrant { user: UserId, class: ClassId },

  /// The general-leader role can only move through the admin-only path.
  #[error("the general-leader role cannot be granted or revoked here")]
  ProtectedGrant,

  /// A scoped role was requested with a missing or foreign scope reference.
  #[error("invalid scope: {0}")]
  MissingScope(String),

  /// Storage or transport failure; retryable, unlike every variant above.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error as an infrastructure failure.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
