//! Privilege grant records.
//!
//! A grant ties a role kind to its holder within one class. Grants carry
//! provenance (`assigned_by`; `None` means system- or seed-assigned) and are
//! owned by the class they reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  id::{ClassId, EnrollmentId, GroupId, StudyAreaId, UserId},
  role::{InstructorRole, StudentRole},
};

// ─── Instructor grants ───────────────────────────────────────────────────────

/// One instructor role kind held by one user in one class.
/// Unique on (user, class, role).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructorGrant {
  pub user_id:     UserId,
  pub class_id:    ClassId,
  pub role:        InstructorRole,
  pub assigned_by: Option<UserId>,
  pub assigned_at: DateTime<Utc>,
}

/// Input to [`ClassStore::insert_instructor_grant`](crate::store::ClassStore).
/// `assigned_at` is always set by the store.
#[derive(Debug, Clone)]
pub struct NewInstructorGrant {
  pub user_id:     UserId,
  pub class_id:    ClassId,
  pub role:        InstructorRole,
  pub assigned_by: Option<UserId>,
}

// ─── Student grants ──────────────────────────────────────────────────────────

/// One student role kind held by one enrollment in one class, optionally
/// narrowed to a group or study area. Unique on (enrollment, class, role);
/// the singularity rules of [`StudentRole::singularity`] bound holders
/// class-wide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentGrant {
  pub enrollment_id: EnrollmentId,
  pub class_id:      ClassId,
  pub role:          StudentRole,
  pub group_id:      Option<GroupId>,
  pub study_area_id: Option<StudyAreaId>,
  pub assigned_by:   Option<UserId>,
  pub assigned_at:   DateTime<Utc>,
}

/// Input to [`ClassStore::replace_student_grant`](crate::store::ClassStore).
/// `assigned_at` is always set by the store.
#[derive(Debug, Clone)]
pub struct NewStudentGrant {
  pub enrollment_id: EnrollmentId,
  pub class_id:      ClassId,
  pub role:          StudentRole,
  pub group_id:      Option<GroupId>,
  pub study_area_id: Option<StudyAreaId>,
  pub assigned_by:   Option<UserId>,
}

/// The optional sub-class narrowing supplied with an assignment request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrantScope {
  pub group_id:      Option<GroupId>,
  pub study_area_id: Option<StudyAreaId>,
}

impl GrantScope {
  pub fn none() -> Self { Self::default() }

  pub fn group(id: GroupId) -> Self {
    Self { group_id: Some(id), study_area_id: None }
  }

  pub fn study_area(id: StudyAreaId) -> Self {
    Self { group_id: None, study_area_id: Some(id) }
  }

  pub fn is_empty(&self) -> bool {
    self.group_id.is_none() && self.study_area_id.is_none()
  }
}
