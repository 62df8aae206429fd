//! Row-to-response conversions and timestamp parsing shared by the handlers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use roomly_db::models::{BookingRow, BookingWithRoomRow, RoomRow, UserRow, decode_features};
use roomly_types::models::{Booking, BookingWithRoom, Room, User};

pub(crate) fn user_to_api(row: UserRow) -> User {
    User {
        id: parse_id(&row.id, "user"),
        username: row.username,
        email: row.email,
        is_admin: row.is_admin,
        created_at: parse_stored_ts(&row.created_at, &row.id),
    }
}

pub(crate) fn room_to_api(row: RoomRow) -> Room {
    let features = decode_features(&row.id, &row.features);
    Room {
        id: parse_id(&row.id, "room"),
        name: row.name,
        capacity: row.capacity,
        floor: row.floor,
        features,
    }
}

pub(crate) fn booking_to_api(row: BookingRow) -> Booking {
    Booking {
        id: parse_id(&row.id, "booking"),
        room_id: parse_id(&row.room_id, "booking room_id"),
        user_name: row.user_name,
        start_time: parse_stored_ts(&row.start_time, &row.id),
        end_time: parse_stored_ts(&row.end_time, &row.id),
        purpose: row.purpose,
        created_at: parse_stored_ts(&row.created_at, &row.id),
    }
}

pub(crate) fn booking_with_room_to_api(row: BookingWithRoomRow) -> BookingWithRoom {
    BookingWithRoom {
        booking: booking_to_api(row.booking),
        room_name: row.room_name,
    }
}

fn parse_id(raw: &str, context: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", context, raw, e);
        Uuid::default()
    })
}

/// Stored timestamps are canonical RFC 3339, but SQLite's `datetime('now')`
/// default produces "YYYY-MM-DD HH:MM:SS" without a timezone; accept both.
fn parse_stored_ts(raw: &str, row_id: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on row '{}': {}", raw, row_id, e);
            DateTime::default()
        })
}

/// Parse a client-supplied timestamp: RFC 3339, or a naive
/// `YYYY-MM-DDTHH:MM[:SS]` interpreted as UTC.
pub(crate) fn parse_client_ts(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = raw.parse::<DateTime<Utc>>() {
        return Some(ts);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ndt.and_utc());
        }
    }
    None
}

/// Parse a range bound that may be a bare date. A date-only lower bound
/// becomes the start of that day, a date-only upper bound its end.
pub(crate) fn parse_range_bound(raw: &str, is_upper: bool) -> Option<DateTime<Utc>> {
    if let Some(ts) = parse_client_ts(raw) {
        return Some(ts);
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let time = if is_upper {
        date.and_hms_opt(23, 59, 59)?
    } else {
        date.and_hms_opt(0, 0, 0)?
    };
    Some(time.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_timestamps_accept_rfc3339_and_naive_forms() {
        let expect = "2025-01-01T09:30:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(parse_client_ts("2025-01-01T09:30:00Z"), Some(expect));
        assert_eq!(parse_client_ts("2025-01-01T09:30:00"), Some(expect));
        assert_eq!(parse_client_ts("2025-01-01T09:30"), Some(expect));
        assert_eq!(parse_client_ts("next tuesday"), None);
        assert_eq!(parse_client_ts(""), None);
    }

    #[test]
    fn range_bounds_widen_bare_dates() {
        let lower = parse_range_bound("2025-01-02", false).unwrap();
        let upper = parse_range_bound("2025-01-02", true).unwrap();
        assert_eq!(lower.to_rfc3339(), "2025-01-02T00:00:00+00:00");
        assert_eq!(upper.to_rfc3339(), "2025-01-02T23:59:59+00:00");
    }

    #[test]
    fn corrupt_rows_degrade_instead_of_failing() {
        let booking = booking_to_api(roomly_db::models::BookingRow {
            id: "not-a-uuid".into(),
            room_id: "also-bad".into(),
            user_name: "alice".into(),
            start_time: "garbage".into(),
            end_time: "2025-01-01T10:00:00Z".into(),
            purpose: "standup".into(),
            created_at: "2025-01-01 08:00:00".into(),
        });
        assert_eq!(booking.id, Uuid::default());
        assert_eq!(booking.start_time, DateTime::<Utc>::default());
        assert_eq!(booking.created_at.to_rfc3339(), "2025-01-01T08:00:00+00:00");
    }
}
