//! The closed role enumerations of the privilege model.
//!
//! Each enum round-trips through a snake_case string (its storage and wire
//! form) via strum; an unknown string fails to parse rather than being
//! silently accepted.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

// ─── Global role ─────────────────────────────────────────────────────────────

/// The institution-wide role fixed at account creation.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GlobalRole {
  /// Superuser; bypasses every per-class capability check.
  Admin,
  /// "Dosen" — eligible to hold instructor-scoped class privileges.
  Instructor,
  /// "Mahasiswa" — eligible to hold enrollment-scoped class privileges.
  Student,
}

// ─── Instructor role kinds ───────────────────────────────────────────────────

/// A per-class privilege grantable to an instructor.
///
/// An instructor may hold several distinct kinds in the same class; each kind
/// is held at most once per (user, class).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InstructorRole {
  CoInstructor,
  /// "Wali kelas" — the class's pastoral lead.
  ClassGuardian,
  MemorizationCoordinator,
  AchievementCoordinator,
  ClassCoordinator,
}

// ─── Student role kinds ──────────────────────────────────────────────────────

/// A per-class privilege grantable to an actively enrolled student.
///
/// Every kind is singular within its scope — see [`StudentRole::singularity`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StudentRole {
  /// "Ketua umum" — the single student per class empowered to assign the
  /// other student roles. Grantable only through the admin-only path.
  GeneralLeader,
  /// Leads one [`Group`](crate::record::Group); the grant must carry the
  /// group reference.
  GroupLeader,
  /// "Kamtib" — order and discipline officer.
  DisciplineOfficer,
  /// Leads one [`StudyArea`](crate::record::StudyArea) ("fan ilmu"); the
  /// grant must carry the study-area reference.
  StudyAreaLeader,
  Secretary,
  Treasurer,
}

/// How many holders a [`StudentRole`] admits, and keyed by what.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Singularity {
  /// At most one holder per class.
  PerClass,
  /// At most one holder per (class, group) pair.
  PerGroup,
  /// At most one holder per (class, study-area) pair.
  PerStudyArea,
}

impl StudentRole {
  /// The uniqueness scope enforced when this role is (re)assigned.
  pub fn singularity(self) -> Singularity {
    match self {
      Self::GroupLeader => Singularity::PerGroup,
      Self::StudyAreaLeader => Singularity::PerStudyArea,
      Self::GeneralLeader
      | Self::DisciplineOfficer
      | Self::Secretary
      | Self::Treasurer => Singularity::PerClass,
    }
  }

  /// Whether this role can only move through the admin-only path.
  pub fn is_protected(self) -> bool { matches!(self, Self::GeneralLeader) }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn student_role_strings_round_trip() {
    for role in StudentRole::iter() {
      let s = role.to_string();
      assert_eq!(StudentRole::from_str(&s).unwrap(), role);
    }
    assert_eq!(StudentRole::GeneralLeader.to_string(), "general_leader");
  }

  #[test]
  fn instructor_role_strings_round_trip() {
    for role in InstructorRole::iter() {
      let s = role.to_string();
      assert_eq!(InstructorRole::from_str(&s).unwrap(), role);
    }
    assert_eq!(
      InstructorRole::MemorizationCoordinator.to_string(),
      "memorization_coordinator"
    );
  }

  #[test]
  fn unknown_role_strings_are_rejected() {
    assert!(StudentRole::from_str("warlord").is_err());
    assert!(InstructorRole::from_str("SECRETARY").is_err());
  }

  #[test]
  fn singularity_scopes() {
    assert_eq!(StudentRole::Secretary.singularity(), Singularity::PerClass);
    assert_eq!(StudentRole::GroupLeader.singularity(), Singularity::PerGroup);
    assert_eq!(
      StudentRole::StudyAreaLeader.singularity(),
      Singularity::PerStudyArea
    );
  }

  #[test]
  fn only_general_leader_is_protected() {
    for role in StudentRole::iter() {
      assert_eq!(role.is_protected(), role == StudentRole::GeneralLeader);
    }
  }
}
