//! SQL schema for the Kelas SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.
//!
//! The partial unique indexes on `student_grants` encode the singularity
//! invariants at the storage layer, so even racing writers that slip past
//! the application-level checks cannot leave a class with two holders of a
//! singular role.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    role          TEXT NOT NULL,      -- 'admin' | 'instructor' | 'student'
    active        INTEGER NOT NULL DEFAULT 1,
    password_hash TEXT,               -- argon2 PHC string, or NULL
    created_at    TEXT NOT NULL       -- ISO 8601 UTC; server-assigned
);

CREATE TABLE IF NOT EXISTS terms (
    term_id    TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS classes (
    class_id   TEXT PRIMARY KEY,
    term_id    TEXT NOT NULL REFERENCES terms(term_id),
    name       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS groups (
    group_id TEXT PRIMARY KEY,
    class_id TEXT NOT NULL REFERENCES classes(class_id) ON DELETE CASCADE,
    name     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS study_areas (
    study_area_id TEXT PRIMARY KEY,
    class_id      TEXT NOT NULL REFERENCES classes(class_id) ON DELETE CASCADE,
    name          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS enrollments (
    enrollment_id TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL REFERENCES users(user_id),
    class_id      TEXT NOT NULL REFERENCES classes(class_id) ON DELETE CASCADE,
    term_id       TEXT NOT NULL REFERENCES terms(term_id),
    status        TEXT NOT NULL,  -- 'active' | 'inactive' | 'graduated' | 'dropped'
    created_at    TEXT NOT NULL,
    UNIQUE (user_id, class_id, term_id)
);

CREATE TABLE IF NOT EXISTS instructor_grants (
    user_id     TEXT NOT NULL REFERENCES users(user_id),
    class_id    TEXT NOT NULL REFERENCES classes(class_id) ON DELETE CASCADE,
    role        TEXT NOT NULL,
    assigned_by TEXT,           -- NULL means system/seed-assigned
    assigned_at TEXT NOT NULL,
    UNIQUE (user_id, class_id, role)
);

CREATE TABLE IF NOT EXISTS student_grants (
    enrollment_id TEXT NOT NULL REFERENCES enrollments(enrollment_id) ON DELETE CASCADE,
    class_id      TEXT NOT NULL REFERENCES classes(class_id) ON DELETE CASCADE,
    role          TEXT NOT NULL,
    group_id      TEXT REFERENCES groups(group_id) ON DELETE CASCADE,
    study_area_id TEXT REFERENCES study_areas(study_area_id) ON DELETE CASCADE,
    assigned_by   TEXT,
    assigned_at   TEXT NOT NULL,
    UNIQUE (enrollment_id, class_id, role)
);

-- Singularity backstops: one holder per class for the class-wide roles,
-- one per (class, group) for group leaders, one per (class, study area)
-- for study-area leaders.
CREATE UNIQUE INDEX IF NOT EXISTS student_grants_singular_idx
    ON student_grants(class_id, role)
    WHERE role IN ('general_leader', 'secretary', 'treasurer', 'discipline_officer');

CREATE UNIQUE INDEX IF NOT EXISTS student_grants_group_idx
    ON student_grants(class_id, role, group_id)
    WHERE role = 'group_leader';

CREATE UNIQUE INDEX IF NOT EXISTS student_grants_area_idx
    ON student_grants(class_id, role, study_area_id)
    WHERE role = 'study_area_leader';

CREATE INDEX IF NOT EXISTS enrollments_user_class_idx ON enrollments(user_id, class_id);
CREATE INDEX IF NOT EXISTS instructor_grants_user_idx ON instructor_grants(user_id, class_id);
CREATE INDEX IF NOT EXISTS student_grants_enrollment_idx ON student_grants(enrollment_id);

PRAGMA user_version = 1;
";
