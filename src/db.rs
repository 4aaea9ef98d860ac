use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::OnceLock;

pub mod accounts;
pub mod challenges;
pub mod rotation;
pub mod schema;
pub mod submissions;

pub type DBResult<T> = Result<T, rusqlite::Error>;

static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Sets the database file for this process. First caller wins; `main`
/// calls this before anything touches the database.
pub fn set_db_path(path: impl Into<PathBuf>) {
    let _ = DB_PATH.set(path.into());
}

pub(crate) fn connect() -> DBResult<Connection> {
    let path = DB_PATH.get_or_init(|| PathBuf::from("grind.db"));
    Connection::open(path)
}

/// Creates all tables if they don't exist yet.
pub fn initialize_db() -> DBResult<()> {
    log::debug!("[initialize_db] creating tables...");
    let connection = connect()?;
    for table in [
        schema::ACCOUNTS_SCHEMA,
        schema::SUBMISSIONS_SCHEMA,
        schema::DAILY_CHALLENGES_SCHEMA,
        schema::ROTATION_ASSIGNMENTS_SCHEMA,
    ] {
        connection.execute(table, [])?;
    }

    Ok(())
}

/// Turns a UNIQUE-constraint failure into `Ok(false)` so that
/// insert-if-absent callers can report "already there" without an error.
pub(crate) fn swallow_constraint_violation(err: rusqlite::Error) -> DBResult<bool> {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Ok(false)
        }
        other => Err(other),
    }
}
