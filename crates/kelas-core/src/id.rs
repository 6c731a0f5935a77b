//! Opaque identifier newtypes.
//!
//! Identifiers are stable strings minted by the store (UUID-shaped in the
//! SQLite backend), but the core never parses or inspects them. Each entity
//! gets its own newtype so an enrollment id cannot be passed where a user id
//! is expected.

use serde::{Deserialize, Serialize};

macro_rules! id_type {
  ($(#[$doc:meta])* $name:ident) => {
    $(#[$doc])*
    #[derive(
      Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(String);

    impl $name {
      pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

      pub fn as_str(&self) -> &str { &self.0 }
    }

    impl std::fmt::Display for $name {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
      }
    }

    impl From<&str> for $name {
      fn from(s: &str) -> Self { Self(s.to_owned()) }
    }

    impl From<String> for $name {
      fn from(s: String) -> Self { Self(s) }
    }
  };
}

id_type!(
  /// Identifies a [`User`](crate::record::User).
  UserId
);
id_type!(
  /// Identifies a [`Term`](crate::record::Term).
  TermId
);
id_type!(
  /// Identifies a [`Class`](crate::record::Class).
  ClassId
);
id_type!(
  /// Identifies a [`Group`](crate::record::Group) within a class.
  GroupId
);
id_type!(
  /// Identifies a [`StudyArea`](crate::record::StudyArea) within a class.
  StudyAreaId
);
id_type!(
  /// Identifies an [`Enrollment`](crate::record::Enrollment).
  EnrollmentId
);
