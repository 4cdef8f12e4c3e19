use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    if origin.trim() == "*" {
        return Ok(CorsLayer::permissive());
    }
    let origin: HeaderValue = origin
        .trim()
        .parse()
        .with_context(|| format!("invalid CORS_ORIGIN: {origin}"))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

pub fn build_router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let cors = cors_layer(&state.config.cors_origin)?;

    let auth = Router::new()
        .route("/signup", post(handlers::auth::signup))
        .route("/verify", post(handlers::auth::verify))
        .route("/signin", post(handlers::auth::signin))
        .route("/forgot-password", post(handlers::auth::forgot_password))
        .route("/reset-password", post(handlers::auth::reset_password))
        .route("/me", get(handlers::auth::me));

    let bookings = Router::new()
        .route("/", post(handlers::bookings::create))
        .route("/user", get(handlers::bookings::list_for_user))
        .route("/vendor", get(handlers::bookings::list_for_vendor))
        .route(
            "/availability/:service_id",
            get(handlers::bookings::availability),
        )
        .route("/:id", get(handlers::bookings::get_by_id))
        .route("/:id/status", put(handlers::bookings::update_status))
        .route("/:id/cancel", put(handlers::bookings::cancel));

    let services = Router::new()
        .route(
            "/",
            get(handlers::services::list).post(handlers::services::create),
        )
        .route(
            "/:id",
            get(handlers::services::get_by_id)
                .put(handlers::services::update)
                .delete(handlers::services::delete),
        );

    let categories = Router::new()
        .route(
            "/",
            get(handlers::categories::list).post(handlers::categories::create),
        )
        .route(
            "/:id",
            get(handlers::categories::get_by_id)
                .put(handlers::categories::update)
                .delete(handlers::categories::delete),
        );

    let vendors = Router::new()
        .route("/", get(handlers::vendors::list))
        .route("/availability", put(handlers::vendors::set_availability))
        .route("/:id", get(handlers::vendors::get_by_id))
        .route("/:id/availability", get(handlers::vendors::get_availability));

    let reviews = Router::new()
        .route("/", post(handlers::reviews::create))
        .route("/service/:id", get(handlers::reviews::list_for_service))
        .route("/:id", axum::routing::delete(handlers::reviews::delete));

    let disputes = Router::new()
        .route(
            "/",
            get(handlers::disputes::list).post(handlers::disputes::create),
        )
        .route("/:id/resolve", put(handlers::disputes::resolve));

    let chat = Router::new()
        .route("/messages", post(handlers::chat::send_message))
        .route("/messages/:other_user_id", get(handlers::chat::messages))
        .route("/conversations", get(handlers::chat::conversations))
        .route("/events", get(handlers::chat::events_stream));

    let admin = Router::new()
        .route("/users", get(handlers::admin::list_users))
        .route("/users/:id/role", put(handlers::admin::update_user_role))
        .route("/bookings", get(handlers::admin::list_bookings))
        .route("/reviews", get(handlers::admin::list_reviews))
        .route(
            "/reviews/:id",
            axum::routing::delete(handlers::admin::delete_review),
        )
        .route("/dashboard", get(handlers::admin::dashboard));

    Ok(Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/auth", auth)
        .nest("/bookings", bookings)
        .nest("/services", services)
        .nest("/categories", categories)
        .nest("/vendors", vendors)
        .nest("/reviews", reviews)
        .nest("/disputes", disputes)
        .nest("/chat", chat)
        .nest("/admin", admin)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}
