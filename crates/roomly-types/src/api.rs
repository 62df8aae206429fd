use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Booking, User};

// -- JWT Claims --

/// JWT claims shared between the login handler and the auth middleware.
/// Canonical definition lives here in roomly-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub is_admin: bool,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: User,
}

// -- Rooms --

/// Room create/update payload. `name`, `capacity` and `floor` are validated
/// in the handler so a missing field yields the API's own error shape
/// rather than a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct RoomRequest {
    pub name: Option<String>,
    pub capacity: Option<i64>,
    pub floor: Option<i64>,
    pub features: Option<Vec<String>>,
}

// -- Availability --

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
    pub conflicts: Vec<Booking>,
}

// -- Bookings --

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub room_id: Uuid,
    pub user_name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub purpose: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BookingRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// -- Deletes --

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: usize,
}
