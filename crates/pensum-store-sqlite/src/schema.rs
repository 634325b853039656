//! SQL schema for the Pensum SQLite store.
//!
//! Migrations are addition-only and gated on `PRAGMA user_version`: entry
//! `N` of [`MIGRATIONS`] moves a database from version `N` to `N + 1`, and
//! every pending entry is applied in order inside one transaction at open.
//! Existing rows are never rewritten by a migration.

/// One DDL batch per schema version, oldest first.
pub const MIGRATIONS: [&str; 2] = [SCHEMA_V1, SCHEMA_V2];

/// Version 1 — the base schema.
///
/// Tasks and sessions reference subjects by id but deliberately carry no
/// FOREIGN KEY clause: subject deletion cascades in application code, and a
/// constraint would reject historical rows whose subject is gone.
const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS subjects (
    subject_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    goal_hours  REAL NOT NULL,
    palette     TEXT NOT NULL     -- JSON [start, end] ARGB pair
);

CREATE TABLE IF NOT EXISTS tasks (
    task_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id   INTEGER NOT NULL,
    subject_name TEXT NOT NULL,   -- denormalised copy of the subject name
    title        TEXT NOT NULL,
    due_date     TEXT NOT NULL,   -- RFC 3339 UTC
    priority     INTEGER NOT NULL,
    complete     INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS sessions (
    session_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id   INTEGER NOT NULL,
    subject_name TEXT NOT NULL,
    started_at   TEXT NOT NULL,   -- RFC 3339 UTC
    duration     INTEGER NOT NULL -- whole seconds
);

CREATE INDEX IF NOT EXISTS tasks_subject_idx ON tasks(subject_id);
";

/// Version 2 — adds free-text task descriptions and the session lookup
/// index. Pre-existing task rows read back with an empty description.
const SCHEMA_V2: &str = "
ALTER TABLE tasks ADD COLUMN description TEXT NOT NULL DEFAULT '';

CREATE INDEX IF NOT EXISTS sessions_subject_idx ON sessions(subject_id);
";
