//! HTTP Basic-auth extractor resolving the acting user.
//!
//! The username is the user id; the password is verified against the argon2
//! PHC string on the user row. This is deliberately the thinnest identity
//! mechanism that names an acting user — session management is out of scope.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;

use kelas_core::{
  Error, id::UserId, record::User, role::GlobalRole, store::ClassStore,
};

use crate::{AppState, error::ApiError};

/// The authenticated acting user, resolved from the request credentials.
pub struct CurrentUser(pub User);

impl CurrentUser {
  /// Guard for the admin-only plumbing endpoints.
  pub fn require_admin(&self) -> Result<(), ApiError> {
    if self.0.role == GlobalRole::Admin {
      Ok(())
    } else {
      Err(ApiError::Forbidden("admin role required".into()))
    }
  }
}

fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Core(Error::Unauthorized))?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Core(Error::Unauthorized))?;

  let decoded =
    B64.decode(encoded).map_err(|_| ApiError::Core(Error::Unauthorized))?;
  let creds = std::str::from_utf8(&decoded)
    .map_err(|_| ApiError::Core(Error::Unauthorized))?;

  let (user_id, password) =
    creds.split_once(':').ok_or(ApiError::Core(Error::Unauthorized))?;
  Ok((user_id.to_owned(), password.to_owned()))
}

/// Verify credentials against the user row; disabled accounts never
/// authenticate.
pub async fn verify_auth<S>(
  headers: &HeaderMap,
  state: &AppState<S>,
) -> Result<User, ApiError>
where
  S: ClassStore,
{
  let (user_id, password) = basic_credentials(headers)?;
  let user_id = UserId::from(user_id);

  let user = state
    .engine
    .store()
    .get_user(user_id.clone())
    .await
    .map_err(Error::store)?
    .ok_or(ApiError::Core(Error::Unauthorized))?;
  if !user.active {
    return Err(ApiError::Core(Error::Unauthorized));
  }

  let hash = state
    .engine
    .store()
    .password_hash(user_id)
    .await
    .map_err(Error::store)?
    .ok_or(ApiError::Core(Error::Unauthorized))?;

  let parsed_hash =
    PasswordHash::new(&hash).map_err(|_| ApiError::Core(Error::Unauthorized))?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Core(Error::Unauthorized))?;

  Ok(user)
}

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: ClassStore + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let user = verify_auth(&parts.headers, state).await?;
    Ok(CurrentUser(user))
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::http::{Request, header};
  use kelas_core::{
    Engine,
    grant::{InstructorGrant, NewInstructorGrant, NewStudentGrant, StudentGrant},
    id::{ClassId, EnrollmentId, GroupId, StudyAreaId, TermId, UserId},
    record::{
      Class, Enrollment, EnrollmentStatus, Group, NewUser, StudyArea, Term, User,
    },
    role::{GlobalRole, InstructorRole, StudentRole},
  };
  use rand_core::OsRng;

  use super::*;
  use crate::ServerConfig;

  // A minimal stub store for testing auth only.
  #[derive(Clone)]
  struct StubStore {
    user: User,
    hash: String,
  }

  impl ClassStore for StubStore {
    type Error = std::convert::Infallible;

    async fn add_user(&self, _: NewUser) -> Result<User, Self::Error> { unimplemented!() }
    async fn get_user(&self, id: UserId) -> Result<Option<User>, Self::Error> {
      Ok((id == self.user.user_id).then(|| self.user.clone()))
    }
    async fn password_hash(&self, id: UserId) -> Result<Option<String>, Self::Error> {
      Ok((id == self.user.user_id).then(|| self.hash.clone()))
    }
    async fn set_user_active(&self, _: UserId, _: bool) -> Result<(), Self::Error> { unimplemented!() }
    async fn add_term(&self, _: String) -> Result<Term, Self::Error> { unimplemented!() }
    async fn add_class(&self, _: TermId, _: String) -> Result<Class, Self::Error> { unimplemented!() }
    async fn get_class(&self, _: ClassId) -> Result<Option<Class>, Self::Error> { unimplemented!() }
    async fn add_group(&self, _: ClassId, _: String) -> Result<Group, Self::Error> { unimplemented!() }
    async fn get_group(&self, _: GroupId) -> Result<Option<Group>, Self::Error> { unimplemented!() }
    async fn add_study_area(&self, _: ClassId, _: String) -> Result<StudyArea, Self::Error> { unimplemented!() }
    async fn get_study_area(&self, _: StudyAreaId) -> Result<Option<StudyArea>, Self::Error> { unimplemented!() }
    async fn enroll(&self, _: UserId, _: ClassId, _: TermId) -> Result<Enrollment, Self::Error> { unimplemented!() }
    async fn set_enrollment_status(&self, _: EnrollmentId, _: EnrollmentStatus) -> Result<(), Self::Error> { unimplemented!() }
    async fn active_enrollment(&self, _: UserId, _: ClassId) -> Result<Option<Enrollment>, Self::Error> { unimplemented!() }
    async fn instructor_grants(&self, _: UserId, _: ClassId) -> Result<Vec<InstructorGrant>, Self::Error> { unimplemented!() }
    async fn insert_instructor_grant(&self, _: NewInstructorGrant) -> Result<InstructorGrant, Self::Error> { unimplemented!() }
    async fn delete_instructor_grant(&self, _: UserId, _: ClassId, _: InstructorRole) -> Result<(), Self::Error> { unimplemented!() }
    async fn student_grants(&self, _: EnrollmentId, _: ClassId) -> Result<Vec<StudentGrant>, Self::Error> { unimplemented!() }
    async fn replace_student_grant(&self, _: NewStudentGrant) -> Result<StudentGrant, Self::Error> { unimplemented!() }
    async fn delete_student_grant(&self, _: EnrollmentId, _: ClassId, _: StudentRole) -> Result<(), Self::Error> { unimplemented!() }
  }

  fn make_state(password: &str, active: bool) -> AppState<StubStore> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();

    let user = User {
      user_id:    UserId::from("u-1"),
      name:       "Ahmad".into(),
      role:       GlobalRole::Student,
      active,
      created_at: chrono::Utc::now(),
    };

    AppState {
      engine: Engine::new(Arc::new(StubStore { user, hash })),
      config: Arc::new(ServerConfig::default()),
    }
  }

  async fn extract(
    req: Request<axum::body::Body>,
    state: &AppState<StubStore>,
  ) -> Result<CurrentUser, ApiError> {
    let (mut parts, _) = req.into_parts();
    CurrentUser::from_request_parts(&mut parts, state).await
  }

  fn basic(user: &str, pass: &str) -> String {
    let encoded = B64.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
  }

  #[tokio::test]
  async fn correct_credentials() {
    let state = make_state("secret", true);
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("u-1", "secret"))
      .body(axum::body::Body::empty())
      .unwrap();
    let current = extract(req, &state).await.unwrap();
    assert_eq!(current.0.user_id, UserId::from("u-1"));
  }

  #[tokio::test]
  async fn wrong_password() {
    let state = make_state("secret", true);
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("u-1", "wrong"))
      .body(axum::body::Body::empty())
      .unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::Core(kelas_core::Error::Unauthorized))
    ));
  }

  #[tokio::test]
  async fn unknown_user() {
    let state = make_state("secret", true);
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("u-2", "secret"))
      .body(axum::body::Body::empty())
      .unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::Core(kelas_core::Error::Unauthorized))
    ));
  }

  #[tokio::test]
  async fn disabled_account() {
    let state = make_state("secret", false);
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("u-1", "secret"))
      .body(axum::body::Body::empty())
      .unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::Core(kelas_core::Error::Unauthorized))
    ));
  }

  #[tokio::test]
  async fn missing_header() {
    let state = make_state("secret", true);
    let req = Request::builder().body(axum::body::Body::empty()).unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::Core(kelas_core::Error::Unauthorized))
    ));
  }

  #[tokio::test]
  async fn invalid_base64() {
    let state = make_state("secret", true);
    let req = Request::builder()
      .header(header::AUTHORIZATION, "Basic !!!not-base64!!!")
      .body(axum::body::Body::empty())
      .unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::Core(kelas_core::Error::Unauthorized))
    ));
  }
}
