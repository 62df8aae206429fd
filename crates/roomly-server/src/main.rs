mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use roomly_api::auth::{self, AppState, AppStateInner, hash_password};
use roomly_api::middleware::require_auth;
use roomly_api::{bookings, rooms, users};
use roomly_db::Database;

use config::{Config, DEFAULT_ADMIN_PASSWORD};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roomly=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database; migrations run here, before any request is served.
    let db = Database::open(&PathBuf::from(&config.db_path))?;
    bootstrap_admin(&db, &config)?;

    let app_state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
    });

    // Routes
    let public_routes = Router::new()
        .route("/api/auth/login", post(auth::login))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/api/auth/register", post(users::register))
        .route("/api/rooms", get(rooms::list_rooms).post(rooms::create_room))
        .route(
            "/api/rooms/{id}",
            get(rooms::get_room)
                .put(rooms::update_room)
                .delete(rooms::delete_room),
        )
        .route("/api/rooms/{id}/availability", get(rooms::check_availability))
        .route(
            "/api/bookings",
            get(bookings::list_all_bookings).post(bookings::create_booking),
        )
        .route(
            "/api/bookings/{id}",
            get(bookings::list_room_bookings).delete(bookings::delete_booking),
        )
        .route("/api/users", get(users::list_users))
        .route("/api/users/{id}", delete(users::delete_user))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Roomly server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the bootstrap administrator when no admin account exists yet,
/// so a fresh deployment can log in and register real users.
fn bootstrap_admin(db: &Database, config: &Config) -> anyhow::Result<()> {
    if db.admin_exists()? {
        return Ok(());
    }

    let password_hash = hash_password(&config.admin_password)?;
    db.create_user(
        &Uuid::new_v4().to_string(),
        "admin",
        &password_hash,
        "admin@roomly.local",
        true,
    )?;

    if config.admin_password == DEFAULT_ADMIN_PASSWORD {
        warn!("Created default admin user with the default password; set ROOMLY_ADMIN_PASSWORD");
    } else {
        info!("Created default admin user");
    }
    Ok(())
}
