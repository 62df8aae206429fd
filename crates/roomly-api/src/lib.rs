pub mod auth;
pub mod bookings;
mod convert;
pub mod error;
pub mod middleware;
pub mod policy;
pub mod rooms;
pub mod users;

use error::ApiError;

/// Run a blocking database closure off the async runtime.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("blocking task join error: {}", e)))?
        .map_err(ApiError::Internal)
}
