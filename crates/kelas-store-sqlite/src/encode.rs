//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. Role kinds and enrollment
//! statuses are stored as their snake_case strum strings; an unknown string
//! is a decode error, never silently accepted.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use kelas_core::{
  grant::{InstructorGrant, StudentGrant},
  record::{Class, Enrollment, EnrollmentStatus, Group, StudyArea, User},
  role::{GlobalRole, InstructorRole, StudentRole},
};

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("bad timestamp {s:?}: {e}")))
}

pub fn decode_global_role(s: &str) -> Result<GlobalRole> {
  GlobalRole::from_str(s)
    .map_err(|_| Error::Decode(format!("unknown global role: {s:?}")))
}

pub fn decode_instructor_role(s: &str) -> Result<InstructorRole> {
  InstructorRole::from_str(s)
    .map_err(|_| Error::Decode(format!("unknown instructor role: {s:?}")))
}

pub fn decode_student_role(s: &str) -> Result<StudentRole> {
  StudentRole::from_str(s)
    .map_err(|_| Error::Decode(format!("unknown student role: {s:?}")))
}

pub fn decode_status(s: &str) -> Result<EnrollmentStatus> {
  EnrollmentStatus::from_str(s)
    .map_err(|_| Error::Decode(format!("unknown enrollment status: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub name:       String,
  pub role:       String,
  pub active:     bool,
  pub created_at: String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    self.user_id.into(),
      name:       self.name,
      role:       decode_global_role(&self.role)?,
      active:     self.active,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawClass {
  pub class_id:   String,
  pub term_id:    String,
  pub name:       String,
  pub created_at: String,
}

impl RawClass {
  pub fn into_class(self) -> Result<Class> {
    Ok(Class {
      class_id:   self.class_id.into(),
      term_id:    self.term_id.into(),
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawGroup {
  pub group_id: String,
  pub class_id: String,
  pub name:     String,
}

impl RawGroup {
  pub fn into_group(self) -> Group {
    Group {
      group_id: self.group_id.into(),
      class_id: self.class_id.into(),
      name:     self.name,
    }
  }
}

pub struct RawStudyArea {
  pub study_area_id: String,
  pub class_id:      String,
  pub name:          String,
}

impl RawStudyArea {
  pub fn into_study_area(self) -> StudyArea {
    StudyArea {
      study_area_id: self.study_area_id.into(),
      class_id:      self.class_id.into(),
      name:          self.name,
    }
  }
}

/// Raw strings read directly from an `enrollments` row.
pub struct RawEnrollment {
  pub enrollment_id: String,
  pub user_id:       String,
  pub class_id:      String,
  pub term_id:       String,
  pub status:        String,
  pub created_at:    String,
}

impl RawEnrollment {
  pub fn into_enrollment(self) -> Result<Enrollment> {
    Ok(Enrollment {
      enrollment_id: self.enrollment_id.into(),
      user_id:       self.user_id.into(),
      class_id:      self.class_id.into(),
      term_id:       self.term_id.into(),
      status:        decode_status(&self.status)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `instructor_grants` row.
pub struct RawInstructorGrant {
  pub user_id:     String,
  pub class_id:    String,
  pub role:        String,
  pub assigned_by: Option<String>,
  pub assigned_at: String,
}

impl RawInstructorGrant {
  pub fn into_grant(self) -> Result<InstructorGrant> {
    Ok(InstructorGrant {
      user_id:     self.user_id.into(),
      class_id:    self.class_id.into(),
      role:        decode_instructor_role(&self.role)?,
      assigned_by: self.assigned_by.map(Into::into),
      assigned_at: decode_dt(&self.assigned_at)?,
    })
  }
}

/// Raw strings read directly from a `student_grants` row.
pub struct RawStudentGrant {
  pub enrollment_id: String,
  pub class_id:      String,
  pub role:          String,
  pub group_id:      Option<String>,
  pub study_area_id: Option<String>,
  pub assigned_by:   Option<String>,
  pub assigned_at:   String,
}

impl RawStudentGrant {
  pub fn into_grant(self) -> Result<StudentGrant> {
    Ok(StudentGrant {
      enrollment_id: self.enrollment_id.into(),
      class_id:      self.class_id.into(),
      role:          decode_student_role(&self.role)?,
      group_id:      self.group_id.map(Into::into),
      study_area_id: self.study_area_id.map(Into::into),
      assigned_by:   self.assigned_by.map(Into::into),
      assigned_at:   decode_dt(&self.assigned_at)?,
    })
  }
}
