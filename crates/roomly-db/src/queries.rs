use crate::models::{BookingRow, BookingWithRoomRow, RoomRow, UserRow};
use crate::{Database, format_timestamp};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        password_hash: &str,
        email: &str,
        is_admin: bool,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password_hash, email, is_admin)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, username, password_hash, email, is_admin],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(conn, "SELECT id, username, password_hash, email, is_admin, created_at FROM users WHERE username = ?1", username)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(conn, "SELECT id, username, password_hash, email, is_admin, created_at FROM users WHERE email = ?1", email)
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(conn, "SELECT id, username, password_hash, email, is_admin, created_at FROM users WHERE id = ?1", id)
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, password_hash, email, is_admin, created_at
                 FROM users ORDER BY username",
            )?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_user(&self, id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(affected)
        })
    }

    pub fn admin_exists(&self) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM users WHERE is_admin = 1", [], |row| {
                    row.get(0)
                })?;
            Ok(count > 0)
        })
    }

    // -- Rooms --

    pub fn create_room(
        &self,
        id: &str,
        name: &str,
        capacity: i64,
        floor: i64,
        features_json: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO rooms (id, name, capacity, floor, features) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, name, capacity, floor, features_json],
            )?;
            Ok(())
        })
    }

    pub fn get_room(&self, id: &str) -> Result<Option<RoomRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, name, capacity, floor, features FROM rooms WHERE id = ?1")?;
            let row = stmt.query_row([id], room_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn list_rooms(&self) -> Result<Vec<RoomRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, capacity, floor, features FROM rooms ORDER BY name")?;
            let rows = stmt
                .query_map([], room_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_room(
        &self,
        id: &str,
        name: &str,
        capacity: i64,
        floor: i64,
        features_json: &str,
    ) -> Result<usize> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE rooms SET name = ?2, capacity = ?3, floor = ?4, features = ?5 WHERE id = ?1",
                rusqlite::params![id, name, capacity, floor, features_json],
            )?;
            Ok(affected)
        })
    }

    /// Bookings referencing the room are intentionally left in place.
    pub fn delete_room(&self, id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM rooms WHERE id = ?1", [id])?;
            Ok(affected)
        })
    }

    // -- Bookings --

    pub fn insert_booking(
        &self,
        id: &str,
        room_id: &str,
        user_name: &str,
        start_time: &DateTime<Utc>,
        end_time: &DateTime<Utc>,
        purpose: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO bookings (id, room_id, user_name, start_time, end_time, purpose)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    id,
                    room_id,
                    user_name,
                    format_timestamp(start_time),
                    format_timestamp(end_time),
                    purpose
                ],
            )?;
            Ok(())
        })
    }

    /// Bookings for the room overlapping the half-open window
    /// `[start_time, end_time)`: a booking ending exactly when the window
    /// starts (or starting exactly when it ends) is not a conflict.
    pub fn find_conflicts(
        &self,
        room_id: &str,
        start_time: &DateTime<Utc>,
        end_time: &DateTime<Utc>,
    ) -> Result<Vec<BookingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, room_id, user_name, start_time, end_time, purpose, created_at
                 FROM bookings
                 WHERE room_id = ?1 AND start_time < ?3 AND end_time > ?2
                 ORDER BY start_time",
            )?;
            let rows = stmt
                .query_map(
                    rusqlite::params![
                        room_id,
                        format_timestamp(start_time),
                        format_timestamp(end_time)
                    ],
                    booking_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Bookings for one room, oldest first, optionally limited to those
    /// starting inside `[from, to]`.
    pub fn bookings_for_room(
        &self,
        room_id: &str,
        from: Option<&DateTime<Utc>>,
        to: Option<&DateTime<Utc>>,
    ) -> Result<Vec<BookingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, room_id, user_name, start_time, end_time, purpose, created_at
                 FROM bookings
                 WHERE room_id = ?1
                   AND (?2 IS NULL OR start_time >= ?2)
                   AND (?3 IS NULL OR start_time <= ?3)
                 ORDER BY start_time ASC",
            )?;
            let rows = stmt
                .query_map(
                    rusqlite::params![
                        room_id,
                        from.map(format_timestamp),
                        to.map(format_timestamp)
                    ],
                    booking_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// All bookings joined with their room's name, newest start first.
    pub fn all_bookings_with_room(&self) -> Result<Vec<BookingWithRoomRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT b.id, b.room_id, b.user_name, b.start_time, b.end_time, b.purpose, b.created_at, r.name
                 FROM bookings b
                 LEFT JOIN rooms r ON b.room_id = r.id
                 ORDER BY b.start_time DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(BookingWithRoomRow {
                        booking: booking_from_row(row)?,
                        room_name: row
                            .get::<_, Option<String>>(7)?
                            .unwrap_or_else(|| "unknown".to_string()),
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_booking(&self, id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM bookings WHERE id = ?1", [id])?;
            Ok(affected)
        })
    }
}

fn query_user(conn: &Connection, sql: &str, key: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(sql)?;
    let row = stmt.query_row([key], user_from_row).optional()?;
    Ok(row)
}

fn user_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        email: row.get(3)?,
        is_admin: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn room_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<RoomRow, rusqlite::Error> {
    Ok(RoomRow {
        id: row.get(0)?,
        name: row.get(1)?,
        capacity: row.get(2)?,
        floor: row.get(3)?,
        features: row.get(4)?,
    })
}

fn booking_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<BookingRow, rusqlite::Error> {
    Ok(BookingRow {
        id: row.get(0)?,
        room_id: row.get(1)?,
        user_name: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        purpose: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn add_room(db: &Database, name: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_room(&id, name, 10, 1, "[]").unwrap();
        id
    }

    fn add_booking(db: &Database, room_id: &str, start: &str, end: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.insert_booking(&id, room_id, "alice", &ts(start), &ts(end), "standup")
            .unwrap();
        id
    }

    #[test]
    fn back_to_back_bookings_do_not_conflict() {
        let db = db();
        let room = add_room(&db, "Conference Room A");
        add_booking(&db, &room, "2025-01-01T09:00:00Z", "2025-01-01T10:00:00Z");

        // Candidate starting exactly when the existing booking ends.
        let conflicts = db
            .find_conflicts(&room, &ts("2025-01-01T10:00:00Z"), &ts("2025-01-01T11:00:00Z"))
            .unwrap();
        assert!(conflicts.is_empty());

        // And the mirror case: candidate ending exactly at the existing start.
        let conflicts = db
            .find_conflicts(&room, &ts("2025-01-01T08:00:00Z"), &ts("2025-01-01T09:00:00Z"))
            .unwrap();
        assert!(conflicts.is_empty());
    }

    #[test]
    fn overlapping_booking_reports_the_existing_one() {
        let db = db();
        let room = add_room(&db, "Conference Room A");
        let existing = add_booking(&db, &room, "2025-01-01T09:00:00Z", "2025-01-01T10:00:00Z");

        let conflicts = db
            .find_conflicts(&room, &ts("2025-01-01T09:30:00Z"), &ts("2025-01-01T10:30:00Z"))
            .unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].id, existing);
    }

    #[test]
    fn containment_and_straddling_windows_conflict() {
        let db = db();
        let room = add_room(&db, "Board Room");
        add_booking(&db, &room, "2025-01-01T09:00:00Z", "2025-01-01T10:00:00Z");

        // Window fully inside the booking.
        assert_eq!(
            db.find_conflicts(&room, &ts("2025-01-01T09:15:00Z"), &ts("2025-01-01T09:45:00Z"))
                .unwrap()
                .len(),
            1
        );
        // Window fully containing the booking.
        assert_eq!(
            db.find_conflicts(&room, &ts("2025-01-01T08:00:00Z"), &ts("2025-01-01T11:00:00Z"))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn conflicts_are_scoped_to_the_room() {
        let db = db();
        let room_a = add_room(&db, "Room A");
        let room_b = add_room(&db, "Room B");
        add_booking(&db, &room_a, "2025-01-01T09:00:00Z", "2025-01-01T10:00:00Z");

        let conflicts = db
            .find_conflicts(&room_b, &ts("2025-01-01T09:00:00Z"), &ts("2025-01-01T10:00:00Z"))
            .unwrap();
        assert!(conflicts.is_empty());
    }

    #[test]
    fn repeated_conflict_queries_are_idempotent() {
        let db = db();
        let room = add_room(&db, "Quiet Room");
        add_booking(&db, &room, "2025-01-01T09:00:00Z", "2025-01-01T10:00:00Z");

        let first = db
            .find_conflicts(&room, &ts("2025-01-01T09:30:00Z"), &ts("2025-01-01T10:30:00Z"))
            .unwrap();
        let second = db
            .find_conflicts(&room, &ts("2025-01-01T09:30:00Z"), &ts("2025-01-01T10:30:00Z"))
            .unwrap();
        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].id, second[0].id);
    }

    #[test]
    fn bookings_for_room_filters_and_orders_ascending() {
        let db = db();
        let room = add_room(&db, "Room A");
        add_booking(&db, &room, "2025-01-03T09:00:00Z", "2025-01-03T10:00:00Z");
        add_booking(&db, &room, "2025-01-01T09:00:00Z", "2025-01-01T10:00:00Z");
        add_booking(&db, &room, "2025-01-02T09:00:00Z", "2025-01-02T10:00:00Z");

        let all = db.bookings_for_room(&room, None, None).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].start_time < all[1].start_time);
        assert!(all[1].start_time < all[2].start_time);

        let filtered = db
            .bookings_for_room(
                &room,
                Some(&ts("2025-01-02T00:00:00Z")),
                Some(&ts("2025-01-02T23:59:59Z")),
            )
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].start_time, "2025-01-02T09:00:00Z");
    }

    #[test]
    fn all_bookings_carry_room_name_newest_first() {
        let db = db();
        let room = add_room(&db, "Conference Room A");
        add_booking(&db, &room, "2025-01-01T09:00:00Z", "2025-01-01T10:00:00Z");
        add_booking(&db, &room, "2025-01-02T09:00:00Z", "2025-01-02T10:00:00Z");

        let all = db.all_bookings_with_room().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].room_name, "Conference Room A");
        assert!(all[0].booking.start_time > all[1].booking.start_time);
    }

    #[test]
    fn delete_booking_removes_exactly_one_row_once() {
        let db = db();
        let room = add_room(&db, "Room A");
        let id = add_booking(&db, &room, "2025-01-01T09:00:00Z", "2025-01-01T10:00:00Z");

        assert_eq!(db.delete_booking(&id).unwrap(), 1);
        assert_eq!(db.delete_booking(&id).unwrap(), 0);
        assert_eq!(db.delete_booking("no-such-id").unwrap(), 0);
    }

    #[test]
    fn deleting_a_room_leaves_its_bookings_behind() {
        // Documented behavior: room deletion does not cascade.
        let db = db();
        let room = add_room(&db, "Doomed Room");
        let booking = add_booking(&db, &room, "2025-01-01T09:00:00Z", "2025-01-01T10:00:00Z");

        assert_eq!(db.delete_room(&room).unwrap(), 1);
        let orphans = db.bookings_for_room(&room, None, None).unwrap();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].id, booking);

        // The admin listing falls back to a placeholder name.
        let all = db.all_bookings_with_room().unwrap();
        assert_eq!(all[0].room_name, "unknown");
    }

    #[test]
    fn room_update_and_delete_report_affected_rows() {
        let db = db();
        let room = add_room(&db, "Old Name");

        assert_eq!(
            db.update_room(&room, "New Name", 12, 3, r#"["tv"]"#).unwrap(),
            1
        );
        let updated = db.get_room(&room).unwrap().unwrap();
        assert_eq!(updated.name, "New Name");
        assert_eq!(updated.capacity, 12);
        assert_eq!(updated.floor, 3);
        assert_eq!(updated.features, r#"["tv"]"#);

        assert_eq!(db.update_room("missing", "x", 1, 1, "[]").unwrap(), 0);
        assert_eq!(db.delete_room("missing").unwrap(), 0);
    }

    #[test]
    fn user_lookup_and_deletion() {
        let db = db();
        assert!(!db.admin_exists().unwrap());

        let id = Uuid::new_v4().to_string();
        db.create_user(&id, "admin", "hash", "admin@roomly.local", true)
            .unwrap();
        assert!(db.admin_exists().unwrap());

        let by_name = db.get_user_by_username("admin").unwrap().unwrap();
        assert!(by_name.is_admin);
        assert_eq!(by_name.email, "admin@roomly.local");
        assert!(db.get_user_by_username("nobody").unwrap().is_none());
        assert!(db.get_user_by_email("admin@roomly.local").unwrap().is_some());

        assert_eq!(db.delete_user(&id).unwrap(), 1);
        assert_eq!(db.delete_user(&id).unwrap(), 0);
        assert!(!db.admin_exists().unwrap());
    }

    #[test]
    fn starter_rooms_are_seeded_once() {
        let db = db();
        let rooms = db.list_rooms().unwrap();
        let names: Vec<&str> = rooms.iter().map(|r| r.name.as_str()).collect();
        assert!(names.contains(&"Conference Room A"));
        assert!(names.contains(&"Conference Room B"));
        assert!(names.contains(&"Board Room"));

        // Re-running migrations must not duplicate the seed.
        db.with_conn(|conn| crate::migrations::run(conn)).unwrap();
        assert_eq!(db.list_rooms().unwrap().len(), rooms.len());
    }
}
