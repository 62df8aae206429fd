use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use roomly_types::api::{BookingRangeQuery, Claims, CreateBookingRequest, DeleteResponse};
use roomly_types::models::{Booking, BookingWithRoom};

use crate::auth::AppState;
use crate::convert::{booking_to_api, booking_with_room_to_api, parse_range_bound};
use crate::error::ApiError;
use crate::policy::require_admin;
use crate::run_blocking;

/// All bookings across all rooms, newest start first. Admin only.
pub async fn list_all_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse + std::fmt::Debug, ApiError> {
    require_admin(&claims)?;

    let db = state.clone();
    let rows = run_blocking(move || db.db.all_bookings_with_room()).await?;

    let bookings: Vec<BookingWithRoom> = rows.into_iter().map(booking_with_room_to_api).collect();
    Ok(Json(bookings))
}

/// Bookings for one room, oldest first, optionally filtered to those
/// starting within `[start_date, end_date]`.
pub async fn list_room_bookings(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(room_id): Path<Uuid>,
    Query(query): Query<BookingRangeQuery>,
) -> Result<impl IntoResponse + std::fmt::Debug, ApiError> {
    let from = parse_bound(query.start_date.as_deref(), false)?;
    let to = parse_bound(query.end_date.as_deref(), true)?;

    let db = state.clone();
    let rid = room_id.to_string();
    let rows =
        run_blocking(move || db.db.bookings_for_room(&rid, from.as_ref(), to.as_ref())).await?;

    let bookings: Vec<Booking> = rows.into_iter().map(booking_to_api).collect();
    Ok(Json(bookings))
}

pub async fn create_booking(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse + std::fmt::Debug, ApiError> {
    let room_id = req.room_id;

    let db = state.clone();
    let rid = room_id.to_string();
    if run_blocking(move || db.db.get_room(&rid)).await?.is_none() {
        return Err(ApiError::NotFound("room not found".to_string()));
    }

    let (user_name, start, end, purpose) = validate_booking_fields(req)?;
    validate_window(Utc::now(), start, end)?;

    let db = state.clone();
    let rid = room_id.to_string();
    let conflicts = run_blocking(move || db.db.find_conflicts(&rid, &start, &end)).await?;
    if !conflicts.is_empty() {
        return Err(ApiError::Conflict {
            message: "slot already booked".to_string(),
            conflicts: conflicts.into_iter().map(booking_to_api).collect(),
        });
    }

    // The conflict check and this insert are deliberately not atomic: two
    // racing requests can both pass the check. Accepted at this scale; the
    // loser of the race observes an overlapping booking, not an error.
    let id = Uuid::new_v4();
    let db = state.clone();
    let bid = id.to_string();
    let rid = room_id.to_string();
    let name = user_name.clone();
    let text = purpose.clone();
    run_blocking(move || db.db.insert_booking(&bid, &rid, &name, &start, &end, &text)).await?;

    Ok((
        StatusCode::CREATED,
        Json(Booking {
            id,
            room_id,
            user_name,
            start_time: start,
            end_time: end,
            purpose,
            created_at: Utc::now(),
        }),
    ))
}

/// Any authenticated user may delete any booking: bookings carry a free-text
/// requester name rather than a user reference, so there is no owner to
/// check against.
pub async fn delete_booking(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse + std::fmt::Debug, ApiError> {
    let db = state.clone();
    let bid = id.to_string();
    let affected = run_blocking(move || db.db.delete_booking(&bid)).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("booking not found".to_string()));
    }

    Ok(Json(DeleteResponse { deleted: affected }))
}

fn parse_bound(raw: Option<&str>, is_upper: bool) -> Result<Option<DateTime<Utc>>, ApiError> {
    match raw {
        None => Ok(None),
        Some(s) => parse_range_bound(s, is_upper).map(Some).ok_or_else(|| {
            ApiError::Validation("start_date and end_date must be valid dates".to_string())
        }),
    }
}

fn validate_booking_fields(
    req: CreateBookingRequest,
) -> Result<(String, DateTime<Utc>, DateTime<Utc>, String), ApiError> {
    match (req.user_name, req.start_time, req.end_time, req.purpose) {
        (Some(user_name), Some(start), Some(end), Some(purpose)) if !user_name.is_empty() => {
            Ok((user_name, start, end, purpose))
        }
        _ => Err(ApiError::Validation(
            "user_name, start_time, end_time and purpose are required".to_string(),
        )),
    }
}

fn validate_window(
    now: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), ApiError> {
    if start < now {
        return Err(ApiError::Validation(
            "start_time must not be in the past".to_string(),
        ));
    }
    if end <= start {
        return Err(ApiError::Validation(
            "end_time must be after start_time".to_string(),
        ));
    }
    Ok(())
}
