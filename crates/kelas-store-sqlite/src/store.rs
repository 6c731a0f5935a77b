//! [`SqliteStore`] — the SQLite implementation of [`ClassStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use kelas_core::{
  grant::{InstructorGrant, NewInstructorGrant, NewStudentGrant, StudentGrant},
  id::{ClassId, EnrollmentId, GroupId, StudyAreaId, TermId, UserId},
  record::{
    Class, Enrollment, EnrollmentStatus, Group, NewUser, StudyArea, Term, User,
  },
  role::{InstructorRole, Singularity, StudentRole},
  store::ClassStore,
};

use crate::{
  encode::{
    encode_dt, RawClass, RawEnrollment, RawGroup, RawInstructorGrant,
    RawStudentGrant, RawStudyArea, RawUser,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Kelas class store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Mint a fresh opaque identifier. UUID-shaped, but nothing downstream
/// depends on that.
fn mint_id() -> String { Uuid::new_v4().hyphenated().to_string() }

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ClassStore impl ─────────────────────────────────────────────────────────

impl ClassStore for SqliteStore {
  type Error = Error;

  // ── Identity ──────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:    mint_id().into(),
      name:       input.name,
      role:       input.role,
      active:     true,
      created_at: Utc::now(),
    };

    let id_str   = user.user_id.as_str().to_owned();
    let name     = user.name.clone();
    let role_str = user.role.to_string();
    let at_str   = encode_dt(user.created_at);
    let hash     = input.password_hash;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, name, role, active, password_hash, created_at)
           VALUES (?1, ?2, ?3, 1, ?4, ?5)",
          rusqlite::params![id_str, name, role_str, hash, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn get_user(&self, id: UserId) -> Result<Option<User>> {
    let id_str = id.as_str().to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, name, role, active, created_at
             FROM users WHERE user_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawUser {
                user_id:    row.get(0)?,
                name:       row.get(1)?,
                role:       row.get(2)?,
                active:     row.get(3)?,
                created_at: row.get(4)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn password_hash(&self, id: UserId) -> Result<Option<String>> {
    let id_str = id.as_str().to_owned();

    let hash: Option<Option<String>> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT password_hash FROM users WHERE user_id = ?1",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;

    Ok(hash.flatten())
  }

  async fn set_user_active(&self, id: UserId, active: bool) -> Result<()> {
    let id_str = id.as_str().to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE users SET active = ?2 WHERE user_id = ?1",
          rusqlite::params![id_str, active],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Terms, classes, sub-resources ─────────────────────────────────────

  async fn add_term(&self, name: String) -> Result<Term> {
    let term = Term {
      term_id:    mint_id().into(),
      name,
      created_at: Utc::now(),
    };

    let id_str   = term.term_id.as_str().to_owned();
    let name_str = term.name.clone();
    let at_str   = encode_dt(term.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO terms (term_id, name, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(term)
  }

  async fn add_class(&self, term_id: TermId, name: String) -> Result<Class> {
    let class = Class {
      class_id:   mint_id().into(),
      term_id,
      name,
      created_at: Utc::now(),
    };

    let id_str   = class.class_id.as_str().to_owned();
    let term_str = class.term_id.as_str().to_owned();
    let name_str = class.name.clone();
    let at_str   = encode_dt(class.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO classes (class_id, term_id, name, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, term_str, name_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(class)
  }

  async fn get_class(&self, id: ClassId) -> Result<Option<Class>> {
    let id_str = id.as_str().to_owned();

    let raw: Option<RawClass> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT class_id, term_id, name, created_at
             FROM classes WHERE class_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawClass {
                class_id:   row.get(0)?,
                term_id:    row.get(1)?,
                name:       row.get(2)?,
                created_at: row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawClass::into_class).transpose()
  }

  async fn add_group(&self, class_id: ClassId, name: String) -> Result<Group> {
    let group = Group { group_id: mint_id().into(), class_id, name };

    let id_str    = group.group_id.as_str().to_owned();
    let class_str = group.class_id.as_str().to_owned();
    let name_str  = group.name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO groups (group_id, class_id, name) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, class_str, name_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(group)
  }

  async fn get_group(&self, id: GroupId) -> Result<Option<Group>> {
    let id_str = id.as_str().to_owned();

    let raw: Option<RawGroup> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT group_id, class_id, name FROM groups WHERE group_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawGroup {
                group_id: row.get(0)?,
                class_id: row.get(1)?,
                name:     row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    Ok(raw.map(RawGroup::into_group))
  }

  async fn add_study_area(
    &self,
    class_id: ClassId,
    name: String,
  ) -> Result<StudyArea> {
    let area = StudyArea { study_area_id: mint_id().into(), class_id, name };

    let id_str    = area.study_area_id.as_str().to_owned();
    let class_str = area.class_id.as_str().to_owned();
    let name_str  = area.name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO study_areas (study_area_id, class_id, name)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, class_str, name_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(area)
  }

  async fn get_study_area(&self, id: StudyAreaId) -> Result<Option<StudyArea>> {
    let id_str = id.as_str().to_owned();

    let raw: Option<RawStudyArea> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT study_area_id, class_id, name
             FROM study_areas WHERE study_area_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawStudyArea {
                study_area_id: row.get(0)?,
                class_id:      row.get(1)?,
                name:          row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    Ok(raw.map(RawStudyArea::into_study_area))
  }

  // ── Enrollments ───────────────────────────────────────────────────────

  async fn enroll(
    &self,
    user_id: UserId,
    class_id: ClassId,
    term_id: TermId,
  ) -> Result<Enrollment> {
    let enrollment = Enrollment {
      enrollment_id: mint_id().into(),
      user_id,
      class_id,
      term_id,
      status: EnrollmentStatus::Active,
      created_at: Utc::now(),
    };

    let id_str     = enrollment.enrollment_id.as_str().to_owned();
    let user_str   = enrollment.user_id.as_str().to_owned();
    let class_str  = enrollment.class_id.as_str().to_owned();
    let term_str   = enrollment.term_id.as_str().to_owned();
    let status_str = enrollment.status.to_string();
    let at_str     = encode_dt(enrollment.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO enrollments
             (enrollment_id, user_id, class_id, term_id, status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id_str, user_str, class_str, term_str, status_str, at_str
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(enrollment)
  }

  async fn set_enrollment_status(
    &self,
    id: EnrollmentId,
    status: EnrollmentStatus,
  ) -> Result<()> {
    let id_str     = id.as_str().to_owned();
    let status_str = status.to_string();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE enrollments SET status = ?2 WHERE enrollment_id = ?1",
          rusqlite::params![id_str, status_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn active_enrollment(
    &self,
    user_id: UserId,
    class_id: ClassId,
  ) -> Result<Option<Enrollment>> {
    let user_str  = user_id.as_str().to_owned();
    let class_str = class_id.as_str().to_owned();

    let raw: Option<RawEnrollment> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT enrollment_id, user_id, class_id, term_id, status, created_at
             FROM enrollments
             WHERE user_id = ?1 AND class_id = ?2 AND status = 'active'
             ORDER BY created_at DESC
             LIMIT 1",
            rusqlite::params![user_str, class_str],
            |row| {
              Ok(RawEnrollment {
                enrollment_id: row.get(0)?,
                user_id:       row.get(1)?,
                class_id:      row.get(2)?,
                term_id:       row.get(3)?,
                status:        row.get(4)?,
                created_at:    row.get(5)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawEnrollment::into_enrollment).transpose()
  }

  // ── Instructor grants ─────────────────────────────────────────────────

  async fn instructor_grants(
    &self,
    user_id: UserId,
    class_id: ClassId,
  ) -> Result<Vec<InstructorGrant>> {
    let user_str  = user_id.as_str().to_owned();
    let class_str = class_id.as_str().to_owned();

    let raws: Vec<RawInstructorGrant> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, class_id, role, assigned_by, assigned_at
           FROM instructor_grants
           WHERE user_id = ?1 AND class_id = ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str, class_str], |row| {
            Ok(RawInstructorGrant {
              user_id:     row.get(0)?,
              class_id:    row.get(1)?,
              role:        row.get(2)?,
              assigned_by: row.get(3)?,
              assigned_at: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInstructorGrant::into_grant).collect()
  }

  async fn insert_instructor_grant(
    &self,
    input: NewInstructorGrant,
  ) -> Result<InstructorGrant> {
    let grant = InstructorGrant {
      user_id:     input.user_id,
      class_id:    input.class_id,
      role:        input.role,
      assigned_by: input.assigned_by,
      assigned_at: Utc::now(),
    };

    let user_str  = grant.user_id.as_str().to_owned();
    let class_str = grant.class_id.as_str().to_owned();
    let role_str  = grant.role.to_string();
    let by_str    = grant.assigned_by.as_ref().map(|u| u.as_str().to_owned());
    let at_str    = encode_dt(grant.assigned_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO instructor_grants
             (user_id, class_id, role, assigned_by, assigned_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![user_str, class_str, role_str, by_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(grant)
  }

  async fn delete_instructor_grant(
    &self,
    user_id: UserId,
    class_id: ClassId,
    role: InstructorRole,
  ) -> Result<()> {
    let user_str  = user_id.as_str().to_owned();
    let class_str = class_id.as_str().to_owned();
    let role_str  = role.to_string();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM instructor_grants
           WHERE user_id = ?1 AND class_id = ?2 AND role = ?3",
          rusqlite::params![user_str, class_str, role_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Student grants ────────────────────────────────────────────────────

  async fn student_grants(
    &self,
    enrollment_id: EnrollmentId,
    class_id: ClassId,
  ) -> Result<Vec<StudentGrant>> {
    let enr_str   = enrollment_id.as_str().to_owned();
    let class_str = class_id.as_str().to_owned();

    let raws: Vec<RawStudentGrant> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT enrollment_id, class_id, role, group_id, study_area_id,
                  assigned_by, assigned_at
           FROM student_grants
           WHERE enrollment_id = ?1 AND class_id = ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![enr_str, class_str], |row| {
            Ok(RawStudentGrant {
              enrollment_id: row.get(0)?,
              class_id:      row.get(1)?,
              role:          row.get(2)?,
              group_id:      row.get(3)?,
              study_area_id: row.get(4)?,
              assigned_by:   row.get(5)?,
              assigned_at:   row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStudentGrant::into_grant).collect()
  }

  async fn replace_student_grant(
    &self,
    input: NewStudentGrant,
  ) -> Result<StudentGrant> {
    let grant = StudentGrant {
      enrollment_id: input.enrollment_id,
      class_id:      input.class_id,
      role:          input.role,
      group_id:      input.group_id,
      study_area_id: input.study_area_id,
      assigned_by:   input.assigned_by,
      assigned_at:   Utc::now(),
    };

    let enr_str   = grant.enrollment_id.as_str().to_owned();
    let class_str = grant.class_id.as_str().to_owned();
    let role_str  = grant.role.to_string();
    let group_str = grant.group_id.as_ref().map(|g| g.as_str().to_owned());
    let area_str  =
      grant.study_area_id.as_ref().map(|a| a.as_str().to_owned());
    let by_str    = grant.assigned_by.as_ref().map(|u| u.as_str().to_owned());
    let at_str    = encode_dt(grant.assigned_at);
    let singularity = grant.role.singularity();

    // Displace-and-insert as one transaction: a concurrent reader never
    // sees two holders of a singular role, or zero mid-reassignment.
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        match singularity {
          Singularity::PerClass => {
            tx.execute(
              "DELETE FROM student_grants WHERE class_id = ?1 AND role = ?2",
              rusqlite::params![class_str, role_str],
            )?;
          }
          Singularity::PerGroup => {
            tx.execute(
              "DELETE FROM student_grants
               WHERE class_id = ?1 AND role = ?2 AND group_id = ?3",
              rusqlite::params![class_str, role_str, group_str],
            )?;
          }
          Singularity::PerStudyArea => {
            tx.execute(
              "DELETE FROM student_grants
               WHERE class_id = ?1 AND role = ?2 AND study_area_id = ?3",
              rusqlite::params![class_str, role_str, area_str],
            )?;
          }
        }

        // A holder may switch scope within the same class; clear any grant
        // of this role already held by the target enrollment too.
        tx.execute(
          "DELETE FROM student_grants
           WHERE enrollment_id = ?1 AND class_id = ?2 AND role = ?3",
          rusqlite::params![enr_str, class_str, role_str],
        )?;

        tx.execute(
          "INSERT INTO student_grants
             (enrollment_id, class_id, role, group_id, study_area_id,
              assigned_by, assigned_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            enr_str, class_str, role_str, group_str, area_str, by_str, at_str
          ],
        )?;

        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(grant)
  }

  async fn delete_student_grant(
    &self,
    enrollment_id: EnrollmentId,
    class_id: ClassId,
    role: StudentRole,
  ) -> Result<()> {
    let enr_str   = enrollment_id.as_str().to_owned();
    let class_str = class_id.as_str().to_owned();
    let role_str  = role.to_string();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM student_grants
           WHERE enrollment_id = ?1 AND class_id = ?2 AND role = ?3",
          rusqlite::params![enr_str, class_str, role_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
