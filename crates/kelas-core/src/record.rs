//! Directory and enrollment records.
//!
//! These are the plain data shapes the engine reasons over. The grant records
//! live in [`crate::grant`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
  id::{ClassId, EnrollmentId, GroupId, StudyAreaId, TermId, UserId},
  role::GlobalRole,
};

// ─── User ────────────────────────────────────────────────────────────────────

/// An account. The global role is fixed at creation; only an admin changes
/// it. Accounts are soft-disabled via `active`, never deleted while
/// referenced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:    UserId,
  pub name:       String,
  pub role:       GlobalRole,
  pub active:     bool,
  pub created_at: DateTime<Utc>,
}

/// Input for creating a [`User`]. The id and timestamp are minted by the
/// store. `password_hash` is an argon2 PHC string consumed only by the HTTP
/// surface's auth layer; the core never reads it.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:          String,
  pub role:          GlobalRole,
  pub password_hash: Option<String>,
}

// ─── Term / class / sub-resources ────────────────────────────────────────────

/// A semester. Classes and enrollments are owned by exactly one term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Term {
  pub term_id:    TermId,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

/// A class; the scope every privilege grant is keyed by.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
  pub class_id:   ClassId,
  pub term_id:    TermId,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

/// A sub-partition of a class's enrolled students.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
  pub group_id: GroupId,
  pub class_id: ClassId,
  pub name:     String,
}

/// A named topic track within a class ("fan ilmu", e.g. "Fiqh").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyArea {
  pub study_area_id: StudyAreaId,
  pub class_id:      ClassId,
  pub name:          String,
}

// ─── Enrollment ──────────────────────────────────────────────────────────────

/// The standing of an [`Enrollment`]. Only `Active` confers standing for
/// privilege purposes.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EnrollmentStatus {
  Active,
  Inactive,
  Graduated,
  Dropped,
}

/// A user's membership in one class for one term. At most one enrollment
/// exists per (user, class, term) triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
  pub enrollment_id: EnrollmentId,
  pub user_id:       UserId,
  pub class_id:      ClassId,
  pub term_id:       TermId,
  pub status:        EnrollmentStatus,
  pub created_at:    DateTime<Utc>,
}

impl Enrollment {
  pub fn is_active(&self) -> bool {
    self.status == EnrollmentStatus::Active
  }
}
