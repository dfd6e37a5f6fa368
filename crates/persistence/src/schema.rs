//! Database schema definitions

/// SQL to create all tables
/// NOTE: timestamps are unix seconds (INTEGER)
pub const CREATE_TABLES: &str = r#"
-- Quiz participants, one row per email
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    picture TEXT,
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
);

-- Quiz submissions, any number per user
CREATE TABLE IF NOT EXISTS results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL REFERENCES users(id),
    points INTEGER NOT NULL,
    time_taken REAL NOT NULL,
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
);

-- ========== INDEXES ==========

CREATE INDEX IF NOT EXISTS idx_results_user ON results(user_id)
"#;
