//! The privilege assignment protocol.
//!
//! These are the only mutation paths into the privilege store. Each
//! operation is one short-lived unit of work: actor standing is checked
//! first, then the target's enrollment and the scope references, and only
//! then does a single atomic store call change grant rows. A failure at any
//! step leaves prior state intact.

use crate::{
  engine::Engine,
  error::{Error, Result},
  grant::{GrantScope, NewInstructorGrant, NewStudentGrant},
  id::{ClassId, UserId},
  record::{Enrollment, User},
  role::{GlobalRole, InstructorRole, Singularity, StudentRole},
  store::ClassStore,
};

impl<S: ClassStore> Engine<S> {
  // ── Actor resolution ──────────────────────────────────────────────────

  /// Resolve the acting user. An unknown id means no identity was
  /// established; a disabled account keeps its identity but all standing.
  async fn resolve_actor(&self, actor: &UserId, class: &ClassId) -> Result<User> {
    let user = self
      .store()
      .get_user(actor.clone())
      .await
      .map_err(Error::store)?
      .ok_or(Error::Unauthorized)?;
    if !user.active {
      return Err(Error::Forbidden {
        actor: actor.clone(),
        class: class.clone(),
      });
    }
    Ok(user)
  }

  async fn require_admin(&self, actor: &UserId, class: &ClassId) -> Result<()> {
    let user = self.resolve_actor(actor, class).await?;
    if user.role != GlobalRole::Admin {
      return Err(Error::Forbidden {
        actor: actor.clone(),
        class: class.clone(),
      });
    }
    Ok(())
  }

  /// Admins pass unconditionally; otherwise the actor must be the class's
  /// current general leader.
  async fn require_leader_or_admin(
    &self,
    actor: &UserId,
    class: &ClassId,
  ) -> Result<()> {
    let user = self.resolve_actor(actor, class).await?;
    if user.role == GlobalRole::Admin {
      return Ok(());
    }
    if self.is_general_leader(actor, class).await? {
      return Ok(());
    }
    Err(Error::Forbidden { actor: actor.clone(), class: class.clone() })
  }

  async fn require_enrolled(
    &self,
    user: &UserId,
    class: &ClassId,
  ) -> Result<Enrollment> {
    self
      .resolve_active_enrollment(user, class)
      .await?
      .ok_or_else(|| Error::NotEnrolled {
        user: user.clone(),
        class: class.clone(),
      })
  }

  // ── Instructor grants (admin only) ────────────────────────────────────

  /// Grant `role` to `target` in `class`.
  ///
  /// A user may hold several distinct instructor role kinds in one class;
  /// holding the same kind twice is [`Error::DuplicateGrant`] and writes
  /// nothing.
  pub async fn assign_instructor_role(
    &self,
    actor: &UserId,
    target: &UserId,
    class: &ClassId,
    role: InstructorRole,
  ) -> Result<()> {
    self.require_admin(actor, class).await?;

    if self.has_instructor_privilege(target, class, role).await? {
      return Err(Error::DuplicateGrant {
        user: target.clone(),
        class: class.clone(),
      });
    }

    self
      .store()
      .insert_instructor_grant(NewInstructorGrant {
        user_id:     target.clone(),
        class_id:    class.clone(),
        role,
        assigned_by: Some(actor.clone()),
      })
      .await
      .map_err(Error::store)?;
    Ok(())
  }

  /// Revoke `role` from `target` in `class`. Revoking a grant that does not
  /// exist is a no-op success.
  pub async fn remove_instructor_role(
    &self,
    actor: &UserId,
    target: &UserId,
    class: &ClassId,
    role: InstructorRole,
  ) -> Result<()> {
    self.require_admin(actor, class).await?;
    self
      .store()
      .delete_instructor_grant(target.clone(), class.clone(), role)
      .await
      .map_err(Error::store)?;
    Ok(())
  }

  // ── General leader (admin only) ───────────────────────────────────────

  /// Make `target` the class's general leader ("ketua umum").
  ///
  /// At most one general leader exists per class: any current holder is
  /// displaced in the same atomic unit that installs the new grant, so a
  /// concurrent reader never sees two holders or zero mid-reassignment.
  pub async fn assign_general_leader(
    &self,
    actor: &UserId,
    target: &UserId,
    class: &ClassId,
  ) -> Result<()> {
    self.require_admin(actor, class).await?;
    let enrollment = self.require_enrolled(target, class).await?;

    self
      .store()
      .replace_student_grant(NewStudentGrant {
        enrollment_id: enrollment.enrollment_id,
        class_id:      class.clone(),
        role:          StudentRole::GeneralLeader,
        group_id:      None,
        study_area_id: None,
        assigned_by:   Some(actor.clone()),
      })
      .await
      .map_err(Error::store)?;
    Ok(())
  }

  // ── Other student grants (general leader, or admin via bypass) ────────

  /// Grant a non-protected student role to `target` in `class`.
  ///
  /// The general-leader role is refused here ([`Error::ProtectedGrant`]);
  /// it only moves through [`Engine::assign_general_leader`]. Scoped roles
  /// must reference a group/study area belonging to this class. The current
  /// holder of the role's singularity key is displaced atomically.
  pub async fn assign_student_role(
    &self,
    actor: &UserId,
    target: &UserId,
    class: &ClassId,
    role: StudentRole,
    scope: GrantScope,
  ) -> Result<()> {
    if role.is_protected() {
      return Err(Error::ProtectedGrant);
    }
    self.require_leader_or_admin(actor, class).await?;
    let enrollment = self.require_enrolled(target, class).await?;
    let scope = self.validate_scope(class, role, scope).await?;

    self
      .store()
      .replace_student_grant(NewStudentGrant {
        enrollment_id: enrollment.enrollment_id,
        class_id:      class.clone(),
        role,
        group_id:      scope.group_id,
        study_area_id: scope.study_area_id,
        assigned_by:   Some(actor.clone()),
      })
      .await
      .map_err(Error::store)?;
    Ok(())
  }

  /// Revoke a non-protected student role from `target` in `class`.
  ///
  /// Idempotent: a target with no such grant — including one with no active
  /// enrollment, whose grants are unreachable by definition — is a no-op
  /// success.
  pub async fn remove_student_role(
    &self,
    actor: &UserId,
    target: &UserId,
    class: &ClassId,
    role: StudentRole,
  ) -> Result<()> {
    if role.is_protected() {
      return Err(Error::ProtectedGrant);
    }
    self.require_leader_or_admin(actor, class).await?;

    let Some(enrollment) = self.resolve_active_enrollment(target, class).await?
    else {
      return Ok(());
    };

    self
      .store()
      .delete_student_grant(enrollment.enrollment_id, class.clone(), role)
      .await
      .map_err(Error::store)?;
    Ok(())
  }

  // ── Scope validation ──────────────────────────────────────────────────

  /// Check the scope references against the role's singularity, and that a
  /// referenced group/study area belongs to `class`. Returns the scope with
  /// only the relevant reference populated.
  async fn validate_scope(
    &self,
    class: &ClassId,
    role: StudentRole,
    scope: GrantScope,
  ) -> Result<GrantScope> {
    match role.singularity() {
      Singularity::PerClass => {
        if !scope.is_empty() {
          return Err(Error::MissingScope(format!(
            "role {role} does not take a group or study-area scope"
          )));
        }
        Ok(GrantScope::none())
      }
      Singularity::PerGroup => {
        if scope.study_area_id.is_some() {
          return Err(Error::MissingScope(format!(
            "role {role} takes a group scope, not a study area"
          )));
        }
        let group_id = scope.group_id.ok_or_else(|| {
          Error::MissingScope(format!("role {role} requires a group"))
        })?;
        let group = self
          .store()
          .get_group(group_id.clone())
          .await
          .map_err(Error::store)?
          .ok_or_else(|| {
            Error::MissingScope(format!("group {group_id} does not exist"))
          })?;
        if group.class_id != *class {
          return Err(Error::MissingScope(format!(
            "group {group_id} belongs to another class"
          )));
        }
        Ok(GrantScope::group(group_id))
      }
      Singularity::PerStudyArea => {
        if scope.group_id.is_some() {
          return Err(Error::MissingScope(format!(
            "role {role} takes a study-area scope, not a group"
          )));
        }
        let study_area_id = scope.study_area_id.ok_or_else(|| {
          Error::MissingScope(format!("role {role} requires a study area"))
        })?;
        let area = self
          .store()
          .get_study_area(study_area_id.clone())
          .await
          .map_err(Error::store)?
          .ok_or_else(|| {
            Error::MissingScope(format!(
              "study area {study_area_id} does not exist"
            ))
          })?;
        if area.class_id != *class {
          return Err(Error::MissingScope(format!(
            "study area {study_area_id} belongs to another class"
          )));
        }
        Ok(GrantScope::study_area(study_area_id))
      }
    }
  }
}
