//! The `ClassStore` trait — the abstract record store behind the engine.
//!
//! The trait is implemented by storage backends (e.g. `kelas-store-sqlite`).
//! The engine and the HTTP surface depend on this abstraction, not on any
//! concrete backend. All lookups are exact-match; all methods return `Send`
//! futures so the trait can be used in multi-threaded async runtimes.
//!
//! The two grant-replacement methods are the transactional seams of the
//! system: each executes as one all-or-nothing unit in the backend, so a
//! concurrent reader never observes a torn delete + insert.

use std::future::Future;

use crate::{
  grant::{InstructorGrant, NewInstructorGrant, NewStudentGrant, StudentGrant},
  id::{ClassId, EnrollmentId, GroupId, StudyAreaId, TermId, UserId},
  record::{Class, Enrollment, EnrollmentStatus, Group, NewUser, StudyArea, Term, User},
  role::{InstructorRole, StudentRole},
};

/// Abstraction over the identity, enrollment, and privilege record stores.
pub trait ClassStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Identity ──────────────────────────────────────────────────────────

  /// Create and persist a user. The id and timestamp are minted here.
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// The user's argon2 PHC string, if one is set. Consumed by the HTTP
  /// surface's auth layer only.
  fn password_hash(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  /// Soft-enable or soft-disable an account. Unknown ids are a no-op.
  fn set_user_active(
    &self,
    id: UserId,
    active: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Terms, classes, sub-resources ─────────────────────────────────────

  fn add_term(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Term, Self::Error>> + Send + '_;

  fn add_class(
    &self,
    term_id: TermId,
    name: String,
  ) -> impl Future<Output = Result<Class, Self::Error>> + Send + '_;

  fn get_class(
    &self,
    id: ClassId,
  ) -> impl Future<Output = Result<Option<Class>, Self::Error>> + Send + '_;

  fn add_group(
    &self,
    class_id: ClassId,
    name: String,
  ) -> impl Future<Output = Result<Group, Self::Error>> + Send + '_;

  fn get_group(
    &self,
    id: GroupId,
  ) -> impl Future<Output = Result<Option<Group>, Self::Error>> + Send + '_;

  fn add_study_area(
    &self,
    class_id: ClassId,
    name: String,
  ) -> impl Future<Output = Result<StudyArea, Self::Error>> + Send + '_;

  fn get_study_area(
    &self,
    id: StudyAreaId,
  ) -> impl Future<Output = Result<Option<StudyArea>, Self::Error>> + Send + '_;

  // ── Enrollments ───────────────────────────────────────────────────────

  /// Enroll a user in a class for a term, with `Active` status.
  /// Rejects a duplicate (user, class, term) triple at the storage layer.
  fn enroll(
    &self,
    user_id: UserId,
    class_id: ClassId,
    term_id: TermId,
  ) -> impl Future<Output = Result<Enrollment, Self::Error>> + Send + '_;

  /// Mutate an enrollment's status. Unknown ids are a no-op.
  fn set_enrollment_status(
    &self,
    id: EnrollmentId,
    status: EnrollmentStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The unique enrollment for (user, class) with `Active` status, if any.
  /// Non-active enrollments are never returned.
  fn active_enrollment(
    &self,
    user_id: UserId,
    class_id: ClassId,
  ) -> impl Future<Output = Result<Option<Enrollment>, Self::Error>> + Send + '_;

  // ── Instructor grants ─────────────────────────────────────────────────

  /// All instructor grants held by `user_id` in `class_id`.
  fn instructor_grants(
    &self,
    user_id: UserId,
    class_id: ClassId,
  ) -> impl Future<Output = Result<Vec<InstructorGrant>, Self::Error>> + Send + '_;

  /// Insert an instructor grant. The (user, class, role) uniqueness
  /// constraint is enforced here as the final backstop; the protocol checks
  /// for duplicates first and reports them as a domain error.
  fn insert_instructor_grant(
    &self,
    input: NewInstructorGrant,
  ) -> impl Future<Output = Result<InstructorGrant, Self::Error>> + Send + '_;

  /// Delete the grant matching (user, class, role). Deleting a non-existent
  /// grant is a no-op success.
  fn delete_instructor_grant(
    &self,
    user_id: UserId,
    class_id: ClassId,
    role: InstructorRole,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Student grants ────────────────────────────────────────────────────

  /// All student grants held by `enrollment_id` in `class_id`.
  fn student_grants(
    &self,
    enrollment_id: EnrollmentId,
    class_id: ClassId,
  ) -> impl Future<Output = Result<Vec<StudentGrant>, Self::Error>> + Send + '_;

  /// Atomically displace the current holder of the grant's singularity key
  /// and insert the new grant, in one all-or-nothing unit.
  ///
  /// The displaced rows are those matching the key derived from
  /// [`StudentRole::singularity`]: (class, role) for per-class roles,
  /// additionally keyed by group or study area for the scoped roles. Both
  /// steps commit or neither does.
  fn replace_student_grant(
    &self,
    input: NewStudentGrant,
  ) -> impl Future<Output = Result<StudentGrant, Self::Error>> + Send + '_;

  /// Delete the grant matching (enrollment, class, role). Deleting a
  /// non-existent grant is a no-op success.
  fn delete_student_grant(
    &self,
    enrollment_id: EnrollmentId,
    class_id: ClassId,
    role: StudentRole,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
