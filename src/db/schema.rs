//! Database schema and migrations for CareData.
//!
//! Migrations are applied in order when the database is opened; the
//! `schema_version` table records which ones already ran.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    username            TEXT NOT NULL,
    email               TEXT NOT NULL,
    full_name           TEXT NOT NULL,
    role                TEXT NOT NULL DEFAULT 'patient',  -- 'patient', 'doctor'
    password            TEXT NOT NULL,                    -- Argon2 hash
    image_filename      TEXT,
    image_stored_name   TEXT,
    created_at          TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE UNIQUE INDEX idx_users_username_nocase ON users(username COLLATE NOCASE);
CREATE UNIQUE INDEX idx_users_email_nocase ON users(email COLLATE NOCASE);
CREATE INDEX idx_users_role ON users(role);
"#,
    // v2: doctor details, one row per user at most
    r#"
CREATE TABLE doctor_details (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id             INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    specialization      TEXT NOT NULL,
    qualification       TEXT NOT NULL,
    experience_years    INTEGER NOT NULL,
    hospital            TEXT NOT NULL,
    location            TEXT NOT NULL,
    about               TEXT,
    updated_at          TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    // v3: uploaded files
    r#"
CREATE TABLE uploaded_files (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id        INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    filename        TEXT NOT NULL,
    stored_name     TEXT NOT NULL UNIQUE,
    content_type    TEXT NOT NULL,
    size            INTEGER NOT NULL,
    description     TEXT,
    created_at      TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_uploaded_files_owner_id ON uploaded_files(owner_id);
"#,
    // v4: server-side sessions (timestamps are unix seconds)
    r#"
CREATE TABLE sessions (
    token       TEXT PRIMARY KEY,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at  INTEGER NOT NULL,
    expires_at  INTEGER NOT NULL
);

CREATE INDEX idx_sessions_user_id ON sessions(user_id);
CREATE INDEX idx_sessions_expires_at ON sessions(expires_at);
"#,
];
