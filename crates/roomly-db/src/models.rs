//! Database row types — these map directly to SQLite rows.
//! Distinct from the roomly-types API models to keep the DB layer independent.

use tracing::warn;

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: String,
}

pub struct RoomRow {
    pub id: String,
    pub name: String,
    pub capacity: i64,
    pub floor: i64,
    pub features: String,
}

pub struct BookingRow {
    pub id: String,
    pub room_id: String,
    pub user_name: String,
    pub start_time: String,
    pub end_time: String,
    pub purpose: String,
    pub created_at: String,
}

pub struct BookingWithRoomRow {
    pub booking: BookingRow,
    pub room_name: String,
}

/// Decode the stored `features` JSON array. A corrupt value degrades to an
/// empty list so one bad row cannot fail a whole room listing.
pub fn decode_features(room_id: &str, raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("Corrupt features '{}' on room '{}': {}", raw, room_id, e);
        Vec::new()
    })
}
