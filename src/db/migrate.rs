//! Schema migrations compiled into the binary.
//!
//! Each migration is applied at most once, inside its own transaction, and recorded in
//! `schema_migrations` by version. The binaries therefore bootstrap the same schema no matter
//! which directory they are started from.

use rusqlite::{params, Connection};
use crate::error::{Result, StaffloadError};

/// One versioned schema change
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

/// Every migration, in ascending version order.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "001_core_tables",
    sql: include_str!("../../migrations/001_core_tables.sql"),
}];

fn ensure_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        )",
    )?;
    Ok(())
}

/// Names of applied migrations, oldest first.
pub fn get_applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM schema_migrations ORDER BY version")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(names)
}

fn applied_versions(conn: &Connection) -> Result<Vec<u32>> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let versions = stmt
        .query_map([], |row| row.get::<_, u32>(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(versions)
}

/// Apply every migration in [`MIGRATIONS`] not yet recorded, returning how many ran.
pub fn run_migrations(conn: &mut Connection) -> Result<usize> {
    apply(conn, MIGRATIONS)
}

fn apply(conn: &mut Connection, migrations: &[Migration]) -> Result<usize> {
    ensure_migrations_table(conn)?;
    let applied = applied_versions(conn)?;

    let latest = migrations.iter().map(|m| m.version).max().unwrap_or(0);
    if let Some(newer) = applied.iter().copied().find(|v| *v > latest) {
        log::warn!(
            "Database has migration version {} but this build only knows up to {}",
            newer,
            latest
        );
    }

    let mut count = 0;
    for migration in migrations.iter().filter(|m| !applied.contains(&m.version)) {
        log::info!("Applying migration {} (version {})", migration.name, migration.version);

        let tx = conn.transaction()?;
        if let Err(e) = tx.execute_batch(migration.sql) {
            log::error!("Migration {} failed: {}", migration.name, e);
            return Err(StaffloadError::Database(e));
        }
        tx.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            params![migration.version, migration.name],
        )?;
        tx.commit()?;
        count += 1;
    }

    if count == 0 {
        log::debug!("Schema up to date ({} migrations)", applied.len());
    } else {
        log::info!("Applied {} migration(s)", count);
    }
    Ok(count)
}
