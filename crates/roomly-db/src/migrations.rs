use anyhow::Result;
use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;

/// Schema migrations, versioned through `PRAGMA user_version`. Run once at
/// startup, before the server accepts requests. Each step is idempotent:
/// re-running against an already-migrated database is a no-op.
pub fn run(conn: &Connection) -> Result<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if version < 1 {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                email           TEXT NOT NULL UNIQUE,
                is_admin        INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS rooms (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                capacity    INTEGER NOT NULL,
                floor       INTEGER NOT NULL,
                features    TEXT NOT NULL DEFAULT '[]'
            );

            -- room_id is a soft reference: deleting a room leaves its
            -- bookings in place, so no FOREIGN KEY constraint here.
            CREATE TABLE IF NOT EXISTS bookings (
                id          TEXT PRIMARY KEY,
                room_id     TEXT NOT NULL,
                user_name   TEXT NOT NULL,
                start_time  TEXT NOT NULL,
                end_time    TEXT NOT NULL,
                purpose     TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_bookings_room_start
                ON bookings(room_id, start_time);
            ",
        )?;
        conn.pragma_update(None, "user_version", 1)?;
        info!("Applied migration 1 (initial schema)");
    }

    seed_rooms(conn)?;

    info!("Database migrations complete");
    Ok(())
}

/// Seed the starter rooms on an empty catalogue.
fn seed_rooms(conn: &Connection) -> Result<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM rooms", [], |row| row.get(0))?;
    if count > 0 {
        return Ok(());
    }

    let starters = [
        ("Conference Room A", 10, 1),
        ("Conference Room B", 6, 1),
        ("Board Room", 20, 2),
    ];
    for (name, capacity, floor) in starters {
        conn.execute(
            "INSERT INTO rooms (id, name, capacity, floor, features) VALUES (?1, ?2, ?3, ?4, '[]')",
            rusqlite::params![Uuid::new_v4().to_string(), name, capacity, floor],
        )?;
    }

    info!("Seeded {} starter rooms", starters.len());
    Ok(())
}
