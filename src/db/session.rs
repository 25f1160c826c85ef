//! Transactional session over the relational store.
//!
//! The ingestion pipeline only talks to storage through [`Storage`]: parameterised queries,
//! single and repeated statement execution, and an explicit commit. Closing a session is dropping
//! it; anything not committed by then is rolled back.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use crate::error::Result;

/// Query/execute interface the pipeline consumes from the store.
pub trait Storage {
    /// Run a query and return every row as a list of column values.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Vec<Value>>>;

    /// Execute one statement, returning the number of affected rows.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize>;

    /// Execute the same statement once per parameter set, returning affected rows per set.
    fn execute_batch(&mut self, sql: &str, param_sets: &[Vec<Value>]) -> Result<Vec<usize>>;

    /// Make everything executed so far durable. Later writes start a new transaction.
    fn commit(&mut self) -> Result<()>;
}

/// SQLite session owning its connection and one open transaction.
pub struct SqliteSession {
    conn: Connection,
    in_transaction: bool,
}

impl SqliteSession {
    /// Take ownership of `conn` and open a transaction on it.
    pub fn begin(conn: Connection) -> Result<Self> {
        conn.execute_batch("BEGIN")?;
        Ok(Self {
            conn,
            in_transaction: true,
        })
    }

    /// Abandon uncommitted writes and close the connection.
    pub fn close(mut self) -> Result<()> {
        self.rollback()
    }

    fn rollback(&mut self) -> Result<()> {
        if self.in_transaction {
            self.in_transaction = false;
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }
}

impl Storage for SqliteSession {
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Vec<Value>>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let column_count = stmt.column_count();
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            (0..column_count)
                .map(|idx| row.get::<_, Value>(idx))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        Ok(stmt.execute(params_from_iter(params.iter()))?)
    }

    fn execute_batch(&mut self, sql: &str, param_sets: &[Vec<Value>]) -> Result<Vec<usize>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let mut affected = Vec::with_capacity(param_sets.len());
        for params in param_sets {
            affected.push(stmt.execute(params_from_iter(params.iter()))?);
        }
        Ok(affected)
    }

    fn commit(&mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        self.in_transaction = false;
        self.conn.execute_batch("BEGIN")?;
        self.in_transaction = true;
        Ok(())
    }
}

impl Drop for SqliteSession {
    fn drop(&mut self) {
        if let Err(e) = self.rollback() {
            log::warn!("Failed to roll back uncommitted session: {}", e);
        }
    }
}
