use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::book_service::MAX_IMAGE_BYTES;
use crate::state::AppState;

/// Multipart framing on top of the largest accepted image.
const BOOK_FORM_LIMIT: usize = MAX_IMAGE_BYTES + 1024 * 1024;

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.web.cors_origins);

    Router::new()
        // Public
        .route("/health", get(public::health))
        .merge(auth_public_routes())
        // Protected API
        .merge(protected_routes(&state))
        // Global middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/register", post(public::register))
        .route("/api/login", post(public::login))
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    use protected::{books, categories, me, orders, stats};

    let book_forms = Router::new()
        .route("/api/books", post(books::create).get(books::list))
        .route(
            "/api/books/:id",
            get(books::get).put(books::update).delete(books::delete),
        )
        .layer(DefaultBodyLimit::max(BOOK_FORM_LIMIT));

    Router::new()
        .route("/api/me", get(me::whoami))
        .route("/api/categories", post(categories::create).get(categories::list))
        .route(
            "/api/categories/:id",
            put(categories::update).delete(categories::delete),
        )
        .merge(book_forms)
        .route("/api/books/stats/total", get(stats::total))
        .route("/api/books/stats/price", get(stats::price))
        .route("/api/orders", post(orders::create).get(orders::list))
        .route("/api/orders/:id/pay", post(orders::pay))
        .route_layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            jwt_auth_middleware,
        ))
}

/// No configured origins means any origin is allowed.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
