//! Shared SQLite PRAGMA tuning applied by every store that opens the database

use rusqlite::Connection;

/// Apply the optimized PRAGMA set: WAL journal, NORMAL sync, in-memory temp
/// store, mmap, larger page cache and a bounded WAL autocheckpoint.
///
/// WAL is what lets dashboard/export readers run concurrently with the
/// ingestion writer.
pub fn apply_optimized_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.pragma_update(None, "mmap_size", 268_435_456i64)?;
    conn.pragma_update(None, "cache_size", -64_000i64)?;
    conn.pragma_update(None, "wal_autocheckpoint", 1000i64)?;
    Ok(())
}
