use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use mingle_api::auth::{self, AppState, AppStateInner};
use mingle_api::middleware::require_auth;
use mingle_api::{friends, hobbies, messages, profile, users};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mingle=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("MINGLE_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("MINGLE_DB_PATH").unwrap_or_else(|_| "mingle.db".into());
    let host = std::env::var("MINGLE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("MINGLE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = mingle_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner { db, jwt_secret });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/filter", get(users::filter_users))
        .route("/hobbies", get(hobbies::list_hobbies))
        .route("/hobbies/{hobby_id}/users", get(hobbies::users_with_hobby))
        .route("/profile", get(profile::get_profile))
        .route("/profile/details", put(profile::update_details))
        .route("/profile/hobbies", post(hobbies::add_hobby))
        .route("/profile/hobbies", delete(hobbies::remove_hobby))
        .route("/friends", get(friends::list_friends))
        .route("/friends/recommendations", get(friends::recommendations))
        .route("/friends/requests", post(friends::send_friend_request))
        .route("/friends/requests", get(friends::list_incoming_requests))
        .route("/friends/requests/respond", put(friends::respond_to_request))
        .route("/messages", post(messages::send_message))
        .route("/messages/{message_id}", get(messages::get_message))
        .route("/messages/with/{user_id}", get(messages::conversation))
        .layer(middleware::from_fn(require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Mingle server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
