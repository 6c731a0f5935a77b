//! The authorization engine — pure decision logic over the record stores.
//!
//! Every query here is total: a missing user, class, or enrollment yields
//! `false`/`None`/empty, never an error. The only failure mode is an
//! infrastructure error from the backend, surfaced as [`Error::Store`] so
//! callers can tell "permission denied" apart from "storage broke".

use std::{collections::BTreeSet, sync::Arc};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
  error::{Error, Result},
  id::{ClassId, UserId},
  record::Enrollment,
  role::{GlobalRole, InstructorRole, StudentRole},
  store::ClassStore,
};

// ─── Capabilities ────────────────────────────────────────────────────────────

/// A business-level action gated by the privilege model.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
  ManageMemorization,
  ManageAchievements,
  EvaluateClass,
  ManageAttendance,
  AssignStudentPrivileges,
  ManageGroups,
}

impl Capability {
  /// The capability rule table, evaluated over the holder's instructor role
  /// set and general-leader standing. Pure so the table itself is testable
  /// without a store; the admin bypass is applied in [`Engine::allows`].
  pub fn granted_to(
    self,
    instructor: &BTreeSet<InstructorRole>,
    general_leader: bool,
  ) -> bool {
    use InstructorRole::*;
    match self {
      Self::ManageMemorization => instructor.contains(&MemorizationCoordinator),
      Self::ManageAchievements => instructor.contains(&AchievementCoordinator),
      Self::EvaluateClass => {
        instructor.contains(&ClassGuardian)
          || instructor.contains(&ClassCoordinator)
      }
      Self::ManageAttendance => {
        instructor.contains(&ClassGuardian)
          || instructor.contains(&CoInstructor)
          || instructor.contains(&ClassCoordinator)
          || general_leader
      }
      Self::AssignStudentPrivileges => general_leader,
      Self::ManageGroups => {
        instructor.contains(&ClassGuardian) || general_leader
      }
    }
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// The authorization engine over a [`ClassStore`] backend.
///
/// Cloning is cheap — the backend handle is reference-counted. The host
/// process owns the backend's lifecycle; the engine holds no other state.
pub struct Engine<S> {
  store: Arc<S>,
}

impl<S> Clone for Engine<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: ClassStore> Engine<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// The backend handle, for callers that need raw record access.
  pub fn store(&self) -> &Arc<S> { &self.store }

  // ── Instructor privilege queries ──────────────────────────────────────

  /// True iff an instructor grant exists for exactly (user, class, role).
  /// No inheritance across role kinds.
  pub async fn has_instructor_privilege(
    &self,
    user_id: &UserId,
    class_id: &ClassId,
    role: InstructorRole,
  ) -> Result<bool> {
    let grants = self
      .store
      .instructor_grants(user_id.clone(), class_id.clone())
      .await
      .map_err(Error::store)?;
    Ok(grants.iter().any(|g| g.role == role))
  }

  /// True iff at least one instructor grant exists for (user, class).
  pub async fn has_any_instructor_privilege(
    &self,
    user_id: &UserId,
    class_id: &ClassId,
  ) -> Result<bool> {
    let grants = self
      .store
      .instructor_grants(user_id.clone(), class_id.clone())
      .await
      .map_err(Error::store)?;
    Ok(!grants.is_empty())
  }

  /// The set of instructor role kinds held by (user, class).
  pub async fn instructor_privileges(
    &self,
    user_id: &UserId,
    class_id: &ClassId,
  ) -> Result<BTreeSet<InstructorRole>> {
    let grants = self
      .store
      .instructor_grants(user_id.clone(), class_id.clone())
      .await
      .map_err(Error::store)?;
    Ok(grants.into_iter().map(|g| g.role).collect())
  }

  // ── Student privilege queries ─────────────────────────────────────────

  /// The unique active enrollment for (user, class), or `None`.
  ///
  /// All student-privilege queries resolve through this; a student with no
  /// active enrollment has zero privileges in the class even if stale grant
  /// rows exist (those are a data-integrity bug, never consulted).
  pub async fn resolve_active_enrollment(
    &self,
    user_id: &UserId,
    class_id: &ClassId,
  ) -> Result<Option<Enrollment>> {
    self
      .store
      .active_enrollment(user_id.clone(), class_id.clone())
      .await
      .map_err(Error::store)
  }

  /// True iff an active enrollment exists for (user, class).
  pub async fn is_actively_enrolled(
    &self,
    user_id: &UserId,
    class_id: &ClassId,
  ) -> Result<bool> {
    Ok(self.resolve_active_enrollment(user_id, class_id).await?.is_some())
  }

  /// True iff the user's active enrollment in the class holds `role`.
  pub async fn has_student_privilege(
    &self,
    user_id: &UserId,
    class_id: &ClassId,
    role: StudentRole,
  ) -> Result<bool> {
    Ok(
      self
        .student_privileges(user_id, class_id)
        .await?
        .contains(&role),
    )
  }

  /// True iff the user is the class's "ketua umum".
  pub async fn is_general_leader(
    &self,
    user_id: &UserId,
    class_id: &ClassId,
  ) -> Result<bool> {
    self
      .has_student_privilege(user_id, class_id, StudentRole::GeneralLeader)
      .await
  }

  /// The set of student role kinds held via the user's active enrollment.
  /// Empty when no active enrollment exists.
  pub async fn student_privileges(
    &self,
    user_id: &UserId,
    class_id: &ClassId,
  ) -> Result<BTreeSet<StudentRole>> {
    let Some(enrollment) =
      self.resolve_active_enrollment(user_id, class_id).await?
    else {
      return Ok(BTreeSet::new());
    };

    let grants = self
      .store
      .student_grants(enrollment.enrollment_id, class_id.clone())
      .await
      .map_err(Error::store)?;
    Ok(grants.into_iter().map(|g| g.role).collect())
  }

  // ── Composite capability checks ───────────────────────────────────────

  /// Whether `user_id` may exercise `capability` in `class_id`.
  ///
  /// An active admin bypasses the rule table unconditionally. A missing or
  /// disabled account gets nothing, admin or not.
  pub async fn allows(
    &self,
    user_id: &UserId,
    class_id: &ClassId,
    capability: Capability,
  ) -> Result<bool> {
    let Some(user) =
      self.store.get_user(user_id.clone()).await.map_err(Error::store)?
    else {
      return Ok(false);
    };
    if !user.active {
      return Ok(false);
    }
    if user.role == GlobalRole::Admin {
      return Ok(true);
    }

    let instructor = self.instructor_privileges(user_id, class_id).await?;
    let general_leader = self.is_general_leader(user_id, class_id).await?;
    Ok(capability.granted_to(&instructor, general_leader))
  }
}
