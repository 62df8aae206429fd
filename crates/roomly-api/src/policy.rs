use roomly_types::api::Claims;

use crate::error::ApiError;

/// Role gate applied after authentication, before admin-only operations.
pub fn require_admin(claims: &Claims) -> Result<(), ApiError> {
    if claims.is_admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "admin privileges required".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use chrono::Utc;
    use uuid::Uuid;

    fn claims(is_admin: bool) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            username: "alice".into(),
            is_admin,
            exp: (Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
        }
    }

    #[test]
    fn admins_pass() {
        assert!(require_admin(&claims(true)).is_ok());
    }

    #[test]
    fn non_admins_get_403() {
        let err = require_admin(&claims(false)).unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }
}
