use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Result};

/// Language used until the user picks one.
pub const DEFAULT_LANGUAGE: &str = "uz";

/// A user as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Telegram user ID
    pub telegram_id: i64,
    /// Telegram @username, if the user has one
    pub username: Option<String>,
    /// Interface language code ("uz", "en", "ru")
    pub language: String,
    /// Whether the user has explicitly chosen a language
    pub language_set: bool,
    /// Next plain-text message is feedback for the admin
    pub feedback_mode: bool,
}

impl UserRecord {
    /// Fresh record with default preferences.
    pub fn new(telegram_id: i64, username: Option<String>) -> Self {
        Self {
            telegram_id,
            username,
            language: DEFAULT_LANGUAGE.to_string(),
            language_set: false,
            feedback_mode: false,
        }
    }
}

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    telegram_id   INTEGER PRIMARY KEY,
    username      TEXT,
    language      TEXT    NOT NULL DEFAULT 'uz',
    language_set  INTEGER NOT NULL DEFAULT 0,
    feedback_mode INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
);
";

/// Create a new database connection pool
///
/// Initializes a connection pool with up to 10 connections and creates the schema.
///
/// # Example
///
/// ```no_run
/// use savexcore::storage::db;
///
/// let pool = db::create_pool("savex.sqlite")?;
/// # Ok::<(), r2d2::Error>(())
/// ```
pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;")
    });
    let pool = Pool::builder().max_size(10).build(manager)?;

    let conn = pool.get()?;
    if let Err(e) = conn.execute_batch(SCHEMA) {
        log::error!("Failed to create schema: {}", e);
    }

    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection is returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}

/// Returns the user record, or `None` for a user we have never seen.
pub fn get_user_record(conn: &DbConnection, telegram_id: i64) -> Result<Option<UserRecord>> {
    conn.query_row(
        "SELECT telegram_id, username, language, language_set, feedback_mode FROM users WHERE telegram_id = ?1",
        params![telegram_id],
        |row| {
            Ok(UserRecord {
                telegram_id: row.get(0)?,
                username: row.get(1)?,
                language: row.get(2)?,
                language_set: row.get(3)?,
                feedback_mode: row.get(4)?,
            })
        },
    )
    .optional()
}

/// Inserts or replaces a user record. `created_at` is kept for existing users.
pub fn set_user_record(conn: &DbConnection, record: &UserRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO users (telegram_id, username, language, language_set, feedback_mode)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(telegram_id) DO UPDATE SET
            username = excluded.username,
            language = excluded.language,
            language_set = excluded.language_set,
            feedback_mode = excluded.feedback_mode",
        params![
            record.telegram_id,
            record.username,
            record.language,
            record.language_set,
            record.feedback_mode
        ],
    )?;
    Ok(())
}

/// Returns the existing record or creates one with defaults.
///
/// Refreshes the stored username when Telegram reports a different one.
pub fn ensure_user(conn: &DbConnection, telegram_id: i64, username: Option<&str>) -> Result<UserRecord> {
    match get_user_record(conn, telegram_id)? {
        Some(mut record) => {
            if username.is_some() && record.username.as_deref() != username {
                record.username = username.map(str::to_string);
                set_user_record(conn, &record)?;
            }
            Ok(record)
        }
        None => {
            let record = UserRecord::new(telegram_id, username.map(str::to_string));
            set_user_record(conn, &record)?;
            log::info!("New user {}", telegram_id);
            Ok(record)
        }
    }
}

/// Returns the user's language, `uz` when unknown.
pub fn get_user_language(conn: &DbConnection, telegram_id: i64) -> Result<String> {
    Ok(get_user_record(conn, telegram_id)?
        .map(|r| r.language)
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()))
}

/// Stores an explicit language choice and marks it as set.
pub fn set_user_language(conn: &DbConnection, telegram_id: i64, language: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO users (telegram_id, language, language_set) VALUES (?1, ?2, 1)
         ON CONFLICT(telegram_id) DO UPDATE SET language = excluded.language, language_set = 1",
        params![telegram_id, language],
    )?;
    Ok(())
}

/// Turns feedback mode on or off.
pub fn set_feedback_mode(conn: &DbConnection, telegram_id: i64, enabled: bool) -> Result<()> {
    conn.execute(
        "INSERT INTO users (telegram_id, feedback_mode) VALUES (?1, ?2)
         ON CONFLICT(telegram_id) DO UPDATE SET feedback_mode = excluded.feedback_mode",
        params![telegram_id, enabled],
    )?;
    Ok(())
}

/// IDs of every stored user, oldest first.
pub fn all_user_ids(conn: &DbConnection) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT telegram_id FROM users ORDER BY created_at, telegram_id")?;
    let ids = stmt.query_map([], |row| row.get(0))?.collect::<Result<Vec<i64>>>()?;
    Ok(ids)
}

/// Number of stored users.
pub fn count_users(conn: &DbConnection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
}
