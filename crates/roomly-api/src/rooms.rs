use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use roomly_types::api::{
    AvailabilityQuery, AvailabilityResponse, Claims, DeleteResponse, RoomRequest,
};
use roomly_types::models::Room;

use crate::auth::AppState;
use crate::convert::{booking_to_api, parse_client_ts, room_to_api};
use crate::error::ApiError;
use crate::policy::require_admin;
use crate::run_blocking;

pub async fn list_rooms(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse + std::fmt::Debug, ApiError> {
    let db = state.clone();
    let rows = run_blocking(move || db.db.list_rooms()).await?;

    let rooms: Vec<Room> = rows.into_iter().map(room_to_api).collect();
    Ok(Json(rooms))
}

pub async fn get_room(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse + std::fmt::Debug, ApiError> {
    let db = state.clone();
    let rid = id.to_string();
    let row = run_blocking(move || db.db.get_room(&rid))
        .await?
        .ok_or_else(|| ApiError::NotFound("room not found".to_string()))?;

    Ok(Json(room_to_api(row)))
}

pub async fn create_room(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<RoomRequest>,
) -> Result<impl IntoResponse + std::fmt::Debug, ApiError> {
    require_admin(&claims)?;
    let (name, capacity, floor, features) = validate_room_request(req)?;

    let id = Uuid::new_v4();
    let features_json =
        serde_json::to_string(&features).map_err(|e| ApiError::Internal(e.into()))?;

    let db = state.clone();
    let rid = id.to_string();
    let room_name = name.clone();
    run_blocking(move || db.db.create_room(&rid, &room_name, capacity, floor, &features_json))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Room {
            id,
            name,
            capacity,
            floor,
            features,
        }),
    ))
}

pub async fn update_room(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<RoomRequest>,
) -> Result<impl IntoResponse + std::fmt::Debug, ApiError> {
    require_admin(&claims)?;
    let (name, capacity, floor, features) = validate_room_request(req)?;

    let features_json =
        serde_json::to_string(&features).map_err(|e| ApiError::Internal(e.into()))?;

    let db = state.clone();
    let rid = id.to_string();
    let room_name = name.clone();
    let affected = run_blocking(move || {
        db.db.update_room(&rid, &room_name, capacity, floor, &features_json)
    })
    .await?;
    if affected == 0 {
        return Err(ApiError::NotFound("room not found".to_string()));
    }

    Ok(Json(Room {
        id,
        name,
        capacity,
        floor,
        features,
    }))
}

pub async fn delete_room(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse + std::fmt::Debug, ApiError> {
    require_admin(&claims)?;

    // Bookings for the room are intentionally left in place.
    let db = state.clone();
    let rid = id.to_string();
    let affected = run_blocking(move || db.db.delete_room(&rid)).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("room not found".to_string()));
    }

    Ok(Json(DeleteResponse { deleted: affected }))
}

/// Read-only availability probe over the half-open window `[start, end)`.
pub async fn check_availability(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse + std::fmt::Debug, ApiError> {
    let (start, end) = parse_window(&query)?;

    let db = state.clone();
    let rid = id.to_string();
    let conflicts = run_blocking(move || {
        if db.db.get_room(&rid)?.is_none() {
            return Ok(None);
        }
        db.db.find_conflicts(&rid, &start, &end).map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::NotFound("room not found".to_string()))?;

    let conflicts: Vec<_> = conflicts.into_iter().map(booking_to_api).collect();
    Ok(Json(AvailabilityResponse {
        available: conflicts.is_empty(),
        conflicts,
    }))
}

fn parse_window(query: &AvailabilityQuery) -> Result<(DateTime<Utc>, DateTime<Utc>), ApiError> {
    let parse = |raw: Option<&str>| {
        raw.and_then(parse_client_ts).ok_or_else(|| {
            ApiError::Validation(
                "start_time and end_time are required and must be valid timestamps".to_string(),
            )
        })
    };
    let start = parse(query.start_time.as_deref())?;
    let end = parse(query.end_time.as_deref())?;
    if end <= start {
        return Err(ApiError::Validation(
            "end_time must be after start_time".to_string(),
        ));
    }
    Ok((start, end))
}

fn validate_room_request(req: RoomRequest) -> Result<(String, i64, i64, Vec<String>), ApiError> {
    match (req.name, req.capacity, req.floor) {
        (Some(name), Some(capacity), Some(floor)) if !name.is_empty() => {
            Ok((name, capacity, floor, req.features.unwrap_or_default()))
        }
        _ => Err(ApiError::Validation(
            "name, capacity and floor are required".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(
        name: Option<&str>,
        capacity: Option<i64>,
        floor: Option<i64>,
        features: Option<Vec<String>>,
    ) -> RoomRequest {
        RoomRequest {
            name: name.map(String::from),
            capacity,
            floor,
            features,
        }
    }

    #[test]
    fn room_request_requires_name_capacity_floor() {
        assert!(validate_room_request(request(None, Some(4), Some(1), None)).is_err());
        assert!(validate_room_request(request(Some("A"), None, Some(1), None)).is_err());
        assert!(validate_room_request(request(Some("A"), Some(4), None, None)).is_err());
        assert!(validate_room_request(request(Some(""), Some(4), Some(1), None)).is_err());
    }

    #[test]
    fn features_default_to_empty() {
        let (_, _, _, features) =
            validate_room_request(request(Some("A"), Some(4), Some(1), None)).unwrap();
        assert!(features.is_empty());

        let (_, _, _, features) = validate_room_request(request(
            Some("A"),
            Some(4),
            Some(1),
            Some(vec!["projector".into()]),
        ))
        .unwrap();
        assert_eq!(features, vec!["projector"]);
    }

    #[test]
    fn availability_window_rejects_missing_or_inverted_bounds() {
        let query = |s: Option<&str>, e: Option<&str>| AvailabilityQuery {
            start_time: s.map(String::from),
            end_time: e.map(String::from),
        };

        assert!(parse_window(&query(None, Some("2025-01-01T10:00:00Z"))).is_err());
        assert!(parse_window(&query(Some("bogus"), Some("2025-01-01T10:00:00Z"))).is_err());
        assert!(
            parse_window(&query(
                Some("2025-01-01T10:00:00Z"),
                Some("2025-01-01T10:00:00Z")
            ))
            .is_err()
        );
        assert!(
            parse_window(&query(
                Some("2025-01-01T09:00:00Z"),
                Some("2025-01-01T10:00:00Z")
            ))
            .is_ok()
        );
    }
}
