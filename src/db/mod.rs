use rusqlite::Connection;
use std::path::Path;
use tokio::task;
use crate::error::{Result, StaffloadError};

pub mod migrate;
pub mod session;

pub use session::{SqliteSession, Storage};

// WAL lets report readers run beside an open ingestion transaction without seeing its writes.
// temp_store = MEMORY and a 64MB cache keep the full-table snapshot reads fast.
const CONNECTION_PRAGMAS: &str = "PRAGMA journal_mode = WAL; \
     PRAGMA synchronous = NORMAL; \
     PRAGMA foreign_keys = ON; \
     PRAGMA temp_store = MEMORY; \
     PRAGMA cache_size = -65536; \
     PRAGMA busy_timeout = 5000;";

/// Database connection wrapper
#[derive(Debug, Clone)]
pub struct Db {
    path: std::path::PathBuf,
}

impl Db {
    /// Create a new database connection manager
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            path: db_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a new database connection with the standard pragmas
    pub fn open_connection(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path).map_err(StaffloadError::Database)?;
        conn.execute_batch(CONNECTION_PRAGMAS)?;
        Ok(conn)
    }

    /// Open a connection and start a transaction on it.
    ///
    /// The session rolls back and closes when dropped without a commit.
    pub fn open_session(&self) -> Result<SqliteSession> {
        SqliteSession::begin(self.open_connection()?)
    }

    /// Open the database and bring its schema up to date, returning how many migrations ran.
    ///
    /// Any failure is reported as [`StaffloadError::Connection`].
    pub async fn initialize(&self) -> Result<usize> {
        self.with_connection(|conn| migrate::run_migrations(conn))
            .await
            .map_err(|e| StaffloadError::Connection(format!(
                "cannot initialize {}: {}",
                self.path().display(),
                e
            )))
    }

    /// Execute a closure with a database connection in a blocking task
    pub async fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        task::spawn_blocking(move || {
            let mut conn = db.open_connection()?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StaffloadError::Task(format!("database task: {}", e)))?
    }

    /// Execute a closure with a fresh session in a blocking task
    pub async fn with_session<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteSession) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        task::spawn_blocking(move || {
            let mut session = db.open_session()?;
            f(&mut session)
        })
        .await
        .map_err(|e| StaffloadError::Task(format!("database task: {}", e)))?
    }
}

/// Fresh database in a temp dir with the crate's migrations applied.
#[cfg(test)]
pub(crate) fn setup_test_db() -> (Db, tempfile::TempDir) {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let db = Db::new(temp_dir.path().join("test.db"));
    let mut conn = db.open_connection().unwrap();
    migrate::run_migrations(&mut conn).unwrap();
    (db, temp_dir)
}
