//! Integration tests for `SqliteStore` and the engine/protocol on top of it,
//! against an in-memory database.

use std::sync::Arc;

use kelas_core::{
  engine::{Capability, Engine},
  error::Error,
  grant::GrantScope,
  id::{ClassId, TermId, UserId},
  record::{EnrollmentStatus, NewUser},
  role::{GlobalRole, InstructorRole, StudentRole},
  store::ClassStore,
};

use crate::SqliteStore;

// ─── Fixture ─────────────────────────────────────────────────────────────────

struct Fixture {
  store:  Arc<SqliteStore>,
  engine: Engine<SqliteStore>,
  admin:  UserId,
  term:   TermId,
  class:  ClassId,
}

async fn fixture() -> Fixture {
  let store = Arc::new(SqliteStore::open_in_memory().await.expect("in-memory store"));
  let engine = Engine::new(store.clone());

  let admin = store
    .add_user(NewUser {
      name:          "Admin".into(),
      role:          GlobalRole::Admin,
      password_hash: None,
    })
    .await
    .unwrap();
  let term = store.add_term("2025/2026 Ganjil".into()).await.unwrap();
  let class = store
    .add_class(term.term_id.clone(), "Kelas 1A".into())
    .await
    .unwrap();

  Fixture {
    store,
    engine,
    admin: admin.user_id,
    term: term.term_id,
    class: class.class_id,
  }
}

impl Fixture {
  /// Add a student account and enroll it in the fixture class.
  async fn student(&self, name: &str) -> UserId {
    let user = self
      .store
      .add_user(NewUser {
        name:          name.into(),
        role:          GlobalRole::Student,
        password_hash: None,
      })
      .await
      .unwrap();
    self
      .store
      .enroll(user.user_id.clone(), self.class.clone(), self.term.clone())
      .await
      .unwrap();
    user.user_id
  }

  /// Add an instructor account (no enrollment).
  async fn instructor(&self, name: &str) -> UserId {
    let user = self
      .store
      .add_user(NewUser {
        name:          name.into(),
        role:          GlobalRole::Instructor,
        password_hash: None,
      })
      .await
      .unwrap();
    user.user_id
  }
}

// ─── Instructor grants ───────────────────────────────────────────────────────

#[tokio::test]
async fn instructor_grant_round_trip() {
  let fx = fixture().await;
  let dosen = fx.instructor("Ust. Hasan").await;

  fx.engine
    .assign_instructor_role(
      &fx.admin,
      &dosen,
      &fx.class,
      InstructorRole::ClassGuardian,
    )
    .await
    .unwrap();

  assert!(
    fx.engine
      .has_instructor_privilege(&dosen, &fx.class, InstructorRole::ClassGuardian)
      .await
      .unwrap()
  );
  assert!(fx.engine.has_any_instructor_privilege(&dosen, &fx.class).await.unwrap());

  fx.engine
    .remove_instructor_role(
      &fx.admin,
      &dosen,
      &fx.class,
      InstructorRole::ClassGuardian,
    )
    .await
    .unwrap();

  assert!(
    !fx
      .engine
      .has_instructor_privilege(&dosen, &fx.class, InstructorRole::ClassGuardian)
      .await
      .unwrap()
  );
}

#[tokio::test]
async fn instructor_holds_multiple_distinct_roles() {
  let fx = fixture().await;
  let dosen = fx.instructor("Ust. Hasan").await;

  fx.engine
    .assign_instructor_role(&fx.admin, &dosen, &fx.class, InstructorRole::ClassGuardian)
    .await
    .unwrap();
  fx.engine
    .assign_instructor_role(
      &fx.admin,
      &dosen,
      &fx.class,
      InstructorRole::MemorizationCoordinator,
    )
    .await
    .unwrap();

  let roles = fx.engine.instructor_privileges(&dosen, &fx.class).await.unwrap();
  assert_eq!(roles.len(), 2);
  assert!(roles.contains(&InstructorRole::ClassGuardian));
  assert!(roles.contains(&InstructorRole::MemorizationCoordinator));

  // Removing one leaves the other intact.
  fx.engine
    .remove_instructor_role(&fx.admin, &dosen, &fx.class, InstructorRole::ClassGuardian)
    .await
    .unwrap();
  let roles = fx.engine.instructor_privileges(&dosen, &fx.class).await.unwrap();
  assert_eq!(roles.len(), 1);
  assert!(roles.contains(&InstructorRole::MemorizationCoordinator));
}

#[tokio::test]
async fn duplicate_instructor_grant_is_rejected_without_corruption() {
  let fx = fixture().await;
  let dosen = fx.instructor("Ust. Hasan").await;

  fx.engine
    .assign_instructor_role(&fx.admin, &dosen, &fx.class, InstructorRole::CoInstructor)
    .await
    .unwrap();
  let err = fx
    .engine
    .assign_instructor_role(&fx.admin, &dosen, &fx.class, InstructorRole::CoInstructor)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DuplicateGrant { .. }));

  let grants = fx
    .store
    .instructor_grants(dosen.clone(), fx.class.clone())
    .await
    .unwrap();
  assert_eq!(grants.len(), 1);
}

#[tokio::test]
async fn removing_nonexistent_instructor_grant_is_a_noop() {
  let fx = fixture().await;
  let dosen = fx.instructor("Ust. Hasan").await;

  fx.engine
    .remove_instructor_role(&fx.admin, &dosen, &fx.class, InstructorRole::ClassCoordinator)
    .await
    .unwrap();
}

#[tokio::test]
async fn instructor_grant_records_who_assigned_it() {
  let fx = fixture().await;
  let dosen = fx.instructor("Ust. Hasan").await;

  fx.engine
    .assign_instructor_role(
      &fx.admin,
      &dosen,
      &fx.class,
      InstructorRole::AchievementCoordinator,
    )
    .await
    .unwrap();

  let grants = fx
    .store
    .instructor_grants(dosen.clone(), fx.class.clone())
    .await
    .unwrap();
  assert_eq!(grants[0].assigned_by.as_ref(), Some(&fx.admin));
}

#[tokio::test]
async fn non_admin_cannot_assign_instructor_roles() {
  let fx = fixture().await;
  let dosen = fx.instructor("Ust. Hasan").await;
  let other = fx.instructor("Ust. Umar").await;

  let err = fx
    .engine
    .assign_instructor_role(&other, &dosen, &fx.class, InstructorRole::CoInstructor)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Forbidden { .. }));
  assert!(!fx.engine.has_any_instructor_privilege(&dosen, &fx.class).await.unwrap());
}

#[tokio::test]
async fn unknown_actor_is_unauthorized() {
  let fx = fixture().await;
  let dosen = fx.instructor("Ust. Hasan").await;

  let err = fx
    .engine
    .assign_instructor_role(
      &UserId::from("no-such-user"),
      &dosen,
      &fx.class,
      InstructorRole::CoInstructor,
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Unauthorized));
}

// ─── General leader ──────────────────────────────────────────────────────────

#[tokio::test]
async fn general_leader_assignment_round_trip() {
  let fx = fixture().await;
  let s1 = fx.student("Ahmad").await;

  fx.engine.assign_general_leader(&fx.admin, &s1, &fx.class).await.unwrap();
  assert!(fx.engine.is_general_leader(&s1, &fx.class).await.unwrap());
}

#[tokio::test]
async fn general_leader_is_singular_and_atomically_replaced() {
  let fx = fixture().await;
  let s1 = fx.student("Ahmad").await;
  let s2 = fx.student("Budi").await;

  fx.engine.assign_general_leader(&fx.admin, &s1, &fx.class).await.unwrap();
  assert!(fx.engine.is_general_leader(&s1, &fx.class).await.unwrap());

  fx.engine.assign_general_leader(&fx.admin, &s2, &fx.class).await.unwrap();
  assert!(!fx.engine.is_general_leader(&s1, &fx.class).await.unwrap());
  assert!(fx.engine.is_general_leader(&s2, &fx.class).await.unwrap());

  // Exactly one general-leader row remains across both enrollments.
  let e1 = fx.engine.resolve_active_enrollment(&s1, &fx.class).await.unwrap().unwrap();
  let e2 = fx.engine.resolve_active_enrollment(&s2, &fx.class).await.unwrap().unwrap();
  let rows1 = fx.store.student_grants(e1.enrollment_id, fx.class.clone()).await.unwrap();
  let rows2 = fx.store.student_grants(e2.enrollment_id, fx.class.clone()).await.unwrap();
  let leaders = rows1
    .iter()
    .chain(rows2.iter())
    .filter(|g| g.role == StudentRole::GeneralLeader)
    .count();
  assert_eq!(leaders, 1);
}

#[tokio::test]
async fn general_leader_requires_active_enrollment() {
  let fx = fixture().await;
  let outsider = fx
    .store
    .add_user(NewUser {
      name:          "Citra".into(),
      role:          GlobalRole::Student,
      password_hash: None,
    })
    .await
    .unwrap();

  let err = fx
    .engine
    .assign_general_leader(&fx.admin, &outsider.user_id, &fx.class)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotEnrolled { .. }));
}

#[tokio::test]
async fn general_leader_cannot_move_through_the_student_path() {
  let fx = fixture().await;
  let s1 = fx.student("Ahmad").await;
  let s2 = fx.student("Budi").await;
  fx.engine.assign_general_leader(&fx.admin, &s1, &fx.class).await.unwrap();

  let err = fx
    .engine
    .assign_student_role(&s1, &s2, &fx.class, StudentRole::GeneralLeader, GrantScope::none())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ProtectedGrant));

  let err = fx
    .engine
    .remove_student_role(&s1, &s1, &fx.class, StudentRole::GeneralLeader)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ProtectedGrant));
  assert!(fx.engine.is_general_leader(&s1, &fx.class).await.unwrap());
}

// ─── Student grants ──────────────────────────────────────────────────────────

#[tokio::test]
async fn student_grant_round_trip() {
  let fx = fixture().await;
  let leader = fx.student("Ahmad").await;
  let s2 = fx.student("Budi").await;
  fx.engine.assign_general_leader(&fx.admin, &leader, &fx.class).await.unwrap();

  fx.engine
    .assign_student_role(&leader, &s2, &fx.class, StudentRole::Secretary, GrantScope::none())
    .await
    .unwrap();
  assert!(
    fx.engine
      .has_student_privilege(&s2, &fx.class, StudentRole::Secretary)
      .await
      .unwrap()
  );

  fx.engine
    .remove_student_role(&leader, &s2, &fx.class, StudentRole::Secretary)
    .await
    .unwrap();
  assert!(
    !fx
      .engine
      .has_student_privilege(&s2, &fx.class, StudentRole::Secretary)
      .await
      .unwrap()
  );
}

#[tokio::test]
async fn singular_roles_have_one_holder_per_class() {
  let fx = fixture().await;
  let leader = fx.student("Ahmad").await;
  let s3 = fx.student("Citra").await;
  let s4 = fx.student("Dewi").await;
  fx.engine.assign_general_leader(&fx.admin, &leader, &fx.class).await.unwrap();

  for role in [
    StudentRole::Secretary,
    StudentRole::Treasurer,
    StudentRole::DisciplineOfficer,
  ] {
    fx.engine
      .assign_student_role(&leader, &s3, &fx.class, role, GrantScope::none())
      .await
      .unwrap();
    fx.engine
      .assign_student_role(&leader, &s4, &fx.class, role, GrantScope::none())
      .await
      .unwrap();

    assert!(!fx.engine.has_student_privilege(&s3, &fx.class, role).await.unwrap());
    assert!(fx.engine.has_student_privilege(&s4, &fx.class, role).await.unwrap());
  }
}

#[tokio::test]
async fn group_leader_is_singular_per_group() {
  let fx = fixture().await;
  let leader = fx.student("Ahmad").await;
  let s3 = fx.student("Citra").await;
  let s4 = fx.student("Dewi").await;
  fx.engine.assign_general_leader(&fx.admin, &leader, &fx.class).await.unwrap();

  let g1 = fx.store.add_group(fx.class.clone(), "Kelompok 1".into()).await.unwrap();
  let g2 = fx.store.add_group(fx.class.clone(), "Kelompok 2".into()).await.unwrap();

  fx.engine
    .assign_student_role(
      &leader,
      &s3,
      &fx.class,
      StudentRole::GroupLeader,
      GrantScope::group(g1.group_id.clone()),
    )
    .await
    .unwrap();
  // A leader in another group coexists.
  fx.engine
    .assign_student_role(
      &leader,
      &s4,
      &fx.class,
      StudentRole::GroupLeader,
      GrantScope::group(g2.group_id.clone()),
    )
    .await
    .unwrap();
  assert!(
    fx.engine
      .has_student_privilege(&s3, &fx.class, StudentRole::GroupLeader)
      .await
      .unwrap()
  );

  // Re-assigning G1 displaces S3, leaves S4's G2 grant alone.
  fx.engine
    .assign_student_role(
      &leader,
      &s4,
      &fx.class,
      StudentRole::GroupLeader,
      GrantScope::group(g1.group_id.clone()),
    )
    .await
    .unwrap();

  assert!(
    !fx
      .engine
      .has_student_privilege(&s3, &fx.class, StudentRole::GroupLeader)
      .await
      .unwrap()
  );
  let e4 = fx.engine.resolve_active_enrollment(&s4, &fx.class).await.unwrap().unwrap();
  let grants = fx.store.student_grants(e4.enrollment_id, fx.class.clone()).await.unwrap();
  let grant = grants
    .iter()
    .find(|g| g.role == StudentRole::GroupLeader)
    .unwrap();
  assert_eq!(grant.group_id.as_ref(), Some(&g1.group_id));
}

#[tokio::test]
async fn study_area_leader_is_singular_per_area() {
  let fx = fixture().await;
  let leader = fx.student("Ahmad").await;
  let s3 = fx.student("Citra").await;
  let s4 = fx.student("Dewi").await;
  fx.engine.assign_general_leader(&fx.admin, &leader, &fx.class).await.unwrap();

  let fiqh = fx.store.add_study_area(fx.class.clone(), "Fiqh".into()).await.unwrap();

  fx.engine
    .assign_student_role(
      &leader,
      &s3,
      &fx.class,
      StudentRole::StudyAreaLeader,
      GrantScope::study_area(fiqh.study_area_id.clone()),
    )
    .await
    .unwrap();
  fx.engine
    .assign_student_role(
      &leader,
      &s4,
      &fx.class,
      StudentRole::StudyAreaLeader,
      GrantScope::study_area(fiqh.study_area_id.clone()),
    )
    .await
    .unwrap();

  assert!(
    !fx
      .engine
      .has_student_privilege(&s3, &fx.class, StudentRole::StudyAreaLeader)
      .await
      .unwrap()
  );
  assert!(
    fx.engine
      .has_student_privilege(&s4, &fx.class, StudentRole::StudyAreaLeader)
      .await
      .unwrap()
  );
}

#[tokio::test]
async fn scoped_roles_require_their_scope() {
  let fx = fixture().await;
  let leader = fx.student("Ahmad").await;
  let s2 = fx.student("Budi").await;
  fx.engine.assign_general_leader(&fx.admin, &leader, &fx.class).await.unwrap();

  let err = fx
    .engine
    .assign_student_role(&leader, &s2, &fx.class, StudentRole::GroupLeader, GrantScope::none())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::MissingScope(_)));

  let err = fx
    .engine
    .assign_student_role(
      &leader,
      &s2,
      &fx.class,
      StudentRole::StudyAreaLeader,
      GrantScope::none(),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::MissingScope(_)));

  assert!(fx.engine.student_privileges(&s2, &fx.class).await.unwrap().is_empty());
}

#[tokio::test]
async fn scope_must_belong_to_the_target_class() {
  let fx = fixture().await;
  let leader = fx.student("Ahmad").await;
  let s2 = fx.student("Budi").await;
  fx.engine.assign_general_leader(&fx.admin, &leader, &fx.class).await.unwrap();

  let other_class = fx
    .store
    .add_class(fx.term.clone(), "Kelas 1B".into())
    .await
    .unwrap();
  let foreign_group = fx
    .store
    .add_group(other_class.class_id.clone(), "Kelompok X".into())
    .await
    .unwrap();

  let err = fx
    .engine
    .assign_student_role(
      &leader,
      &s2,
      &fx.class,
      StudentRole::GroupLeader,
      GrantScope::group(foreign_group.group_id),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::MissingScope(_)));
}

#[tokio::test]
async fn unscoped_roles_reject_a_scope() {
  let fx = fixture().await;
  let leader = fx.student("Ahmad").await;
  let s2 = fx.student("Budi").await;
  fx.engine.assign_general_leader(&fx.admin, &leader, &fx.class).await.unwrap();
  let g1 = fx.store.add_group(fx.class.clone(), "Kelompok 1".into()).await.unwrap();

  let err = fx
    .engine
    .assign_student_role(
      &leader,
      &s2,
      &fx.class,
      StudentRole::Secretary,
      GrantScope::group(g1.group_id),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::MissingScope(_)));
}

#[tokio::test]
async fn non_leader_student_cannot_assign_roles() {
  let fx = fixture().await;
  let s1 = fx.student("Ahmad").await;
  let s2 = fx.student("Budi").await;

  let err = fx
    .engine
    .assign_student_role(&s1, &s2, &fx.class, StudentRole::Secretary, GrantScope::none())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Forbidden { .. }));
  assert!(fx.engine.student_privileges(&s2, &fx.class).await.unwrap().is_empty());
}

#[tokio::test]
async fn admin_may_assign_student_roles_directly() {
  let fx = fixture().await;
  let s2 = fx.student("Budi").await;

  fx.engine
    .assign_student_role(&fx.admin, &s2, &fx.class, StudentRole::Treasurer, GrantScope::none())
    .await
    .unwrap();
  assert!(
    fx.engine
      .has_student_privilege(&s2, &fx.class, StudentRole::Treasurer)
      .await
      .unwrap()
  );
}

#[tokio::test]
async fn assigning_to_an_unenrolled_target_fails() {
  let fx = fixture().await;
  let leader = fx.student("Ahmad").await;
  fx.engine.assign_general_leader(&fx.admin, &leader, &fx.class).await.unwrap();

  let outsider = fx
    .store
    .add_user(NewUser {
      name:          "Citra".into(),
      role:          GlobalRole::Student,
      password_hash: None,
    })
    .await
    .unwrap();

  let err = fx
    .engine
    .assign_student_role(
      &leader,
      &outsider.user_id,
      &fx.class,
      StudentRole::Secretary,
      GrantScope::none(),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotEnrolled { .. }));
}

#[tokio::test]
async fn removing_a_grant_nobody_holds_is_a_noop() {
  let fx = fixture().await;
  let leader = fx.student("Ahmad").await;
  let s2 = fx.student("Budi").await;
  fx.engine.assign_general_leader(&fx.admin, &leader, &fx.class).await.unwrap();

  // No grant exists; also fine for a target with no enrollment at all.
  fx.engine
    .remove_student_role(&leader, &s2, &fx.class, StudentRole::Treasurer)
    .await
    .unwrap();
  fx.engine
    .remove_student_role(
      &leader,
      &UserId::from("nobody"),
      &fx.class,
      StudentRole::Treasurer,
    )
    .await
    .unwrap();
}

// ─── Enrollment gating ───────────────────────────────────────────────────────

#[tokio::test]
async fn privileges_vanish_when_enrollment_leaves_active() {
  let fx = fixture().await;
  let leader = fx.student("Ahmad").await;
  let s2 = fx.student("Budi").await;
  fx.engine.assign_general_leader(&fx.admin, &leader, &fx.class).await.unwrap();
  fx.engine
    .assign_student_role(&leader, &s2, &fx.class, StudentRole::Secretary, GrantScope::none())
    .await
    .unwrap();

  let enrollment = fx
    .engine
    .resolve_active_enrollment(&s2, &fx.class)
    .await
    .unwrap()
    .unwrap();
  fx.store
    .set_enrollment_status(enrollment.enrollment_id.clone(), EnrollmentStatus::Dropped)
    .await
    .unwrap();

  // The grant row still exists, but is no longer reachable.
  let rows = fx
    .store
    .student_grants(enrollment.enrollment_id, fx.class.clone())
    .await
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert!(
    !fx
      .engine
      .has_student_privilege(&s2, &fx.class, StudentRole::Secretary)
      .await
      .unwrap()
  );
  assert!(!fx.engine.is_actively_enrolled(&s2, &fx.class).await.unwrap());
  assert!(fx.engine.student_privileges(&s2, &fx.class).await.unwrap().is_empty());
}

// ─── Composite capabilities ──────────────────────────────────────────────────

#[tokio::test]
async fn capabilities_follow_instructor_roles() {
  let fx = fixture().await;
  let dosen = fx.instructor("Ust. Hasan").await;

  fx.engine
    .assign_instructor_role(
      &fx.admin,
      &dosen,
      &fx.class,
      InstructorRole::MemorizationCoordinator,
    )
    .await
    .unwrap();

  assert!(
    fx.engine
      .allows(&dosen, &fx.class, Capability::ManageMemorization)
      .await
      .unwrap()
  );
  assert!(
    !fx
      .engine
      .allows(&dosen, &fx.class, Capability::ManageAchievements)
      .await
      .unwrap()
  );
  assert!(
    !fx
      .engine
      .allows(&dosen, &fx.class, Capability::ManageAttendance)
      .await
      .unwrap()
  );
}

#[tokio::test]
async fn general_leader_gets_attendance_and_assignment_capabilities() {
  let fx = fixture().await;
  let leader = fx.student("Ahmad").await;
  fx.engine.assign_general_leader(&fx.admin, &leader, &fx.class).await.unwrap();

  assert!(
    fx.engine
      .allows(&leader, &fx.class, Capability::ManageAttendance)
      .await
      .unwrap()
  );
  assert!(
    fx.engine
      .allows(&leader, &fx.class, Capability::AssignStudentPrivileges)
      .await
      .unwrap()
  );
  assert!(
    fx.engine.allows(&leader, &fx.class, Capability::ManageGroups).await.unwrap()
  );
  assert!(
    !fx
      .engine
      .allows(&leader, &fx.class, Capability::EvaluateClass)
      .await
      .unwrap()
  );
}

#[tokio::test]
async fn admin_bypasses_every_capability_check() {
  let fx = fixture().await;

  for cap in [
    Capability::ManageMemorization,
    Capability::ManageAchievements,
    Capability::EvaluateClass,
    Capability::ManageAttendance,
    Capability::AssignStudentPrivileges,
    Capability::ManageGroups,
  ] {
    assert!(fx.engine.allows(&fx.admin, &fx.class, cap).await.unwrap());
  }
}

#[tokio::test]
async fn disabled_accounts_lose_all_capabilities() {
  let fx = fixture().await;
  fx.store.set_user_active(fx.admin.clone(), false).await.unwrap();

  assert!(
    !fx
      .engine
      .allows(&fx.admin, &fx.class, Capability::ManageGroups)
      .await
      .unwrap()
  );
  let err = fx
    .engine
    .assign_general_leader(&fx.admin, &fx.admin, &fx.class)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Forbidden { .. }));
}

#[tokio::test]
async fn queries_are_total_for_unknown_ids() {
  let fx = fixture().await;
  let ghost = UserId::from("no-such-user");
  let nowhere = ClassId::from("no-such-class");

  assert!(!fx.engine.has_any_instructor_privilege(&ghost, &nowhere).await.unwrap());
  assert!(!fx.engine.is_general_leader(&ghost, &nowhere).await.unwrap());
  assert!(!fx.engine.is_actively_enrolled(&ghost, &nowhere).await.unwrap());
  assert!(!fx.engine.allows(&ghost, &nowhere, Capability::ManageGroups).await.unwrap());
  assert!(fx.engine.student_privileges(&ghost, &nowhere).await.unwrap().is_empty());
}
