//! Versioned schema for the desktop database file.
//!
//! The schema is an ordered list of SQL scripts. A file's position in that list is its
//! `PRAGMA user_version`; opening a file runs every later script in one transaction and bumps
//! the version after each, so a failed upgrade leaves the file untouched.

use rusqlite::Connection;

use crate::sqlite::{DbError, DbResult};

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    script: &'static str,
}

/// Ordered by `version`, starting at 1 with no gaps.
const SCHEMA_STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    script: include_str!("migrations/0001_collections.sql"),
}];

/// Schema version this build writes.
pub fn schema_version() -> u32 {
    SCHEMA_STEPS.len() as u32
}

/// Scripts a file at `stored` still needs.
fn pending_steps(stored: u32) -> DbResult<&'static [SchemaStep]> {
    let newest = schema_version();
    if stored > newest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: stored,
            latest_supported: newest,
        });
    }
    Ok(&SCHEMA_STEPS[stored as usize..])
}

/// Brings the file behind `conn` up to [`schema_version`].
///
/// # Errors
///
/// Fails for files written by a newer build, or when a script is rejected.
pub fn migrate(conn: &mut Connection) -> DbResult<()> {
    let steps = pending_steps(stored_version(conn)?)?;
    if steps.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in steps {
        tx.execute_batch(step.script)?;
        tx.pragma_update(None, "user_version", step.version)?;
    }
    tx.commit()?;
    Ok(())
}

/// Version recorded in the file; `0` for a fresh one.
pub fn stored_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_are_numbered_by_position() {
        for (position, step) in SCHEMA_STEPS.iter().enumerate() {
            assert_eq!(step.version as usize, position + 1);
        }
    }

    #[test]
    fn pending_steps_skip_applied_versions() {
        assert_eq!(pending_steps(0).expect("fresh").len(), SCHEMA_STEPS.len());
        assert!(pending_steps(schema_version()).expect("current").is_empty());
        assert!(matches!(
            pending_steps(schema_version() + 1),
            Err(DbError::UnsupportedSchemaVersion { .. })
        ));
    }
}
