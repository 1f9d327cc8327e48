pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;

#[cfg(test)]
pub mod testing;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::{jwt_auth_middleware, require_admin, require_instructor};
pub use crate::state::AppState;

/// Builds the full HTTP surface over the given state
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        // Public
        .merge(public_routes())
        // Bearer token
        .merge(protected_routes(state.clone()))
        // Bearer token + role
        .merge(admin_routes(state.clone()))
        .merge(instructor_routes(state.clone()))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    use handlers::public;

    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/api/set-token", post(public::set_token))
        // Users
        .route("/new-user", post(public::user_post))
        .route("/users", get(public::users_list))
        .route("/users/:id", get(public::user_get))
        // Classes
        .route("/classes", get(public::classes_approved))
        .route("/approved-classes", get(public::classes_approved))
        .route("/classes-manage", get(public::classes_manage))
        .route("/class/:id", get(public::class_get))
        .route("/popular_classes", get(public::classes_popular))
        // Instructors
        .route("/instructors", get(public::instructors_list))
        .route("/popular-instructors", get(public::instructors_popular))
        .route("/as-instructor", post(public::instructor_apply))
        .route("/applied-instructors/:email", get(public::instructor_application))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use handlers::protected;

    Router::new()
        .route("/user/:email", get(protected::user_by_email))
        // Cart
        .route("/add-to-cart", post(protected::cart_add))
        .route("/cart-item/:id", get(protected::cart_item_get))
        .route("/cart/:email", get(protected::cart_list))
        .route("/delete-cart-item/:id", delete(protected::cart_item_delete))
        // Payments and enrollments
        .route("/payment-info", post(protected::payment_post))
        .route("/payment-history/:email", get(protected::payment_history))
        .route("/payment-history-length/:email", get(protected::payment_history_length))
        .route("/enrolled-classes/:email", get(protected::enrolled_classes))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

// Layers wrap the routes added before them, so the token check runs ahead of the role guard
fn admin_routes(state: AppState) -> Router<AppState> {
    use handlers::elevated;

    Router::new()
        .route("/delete-user/:id", delete(elevated::user_delete))
        .route("/update-user/:id", put(elevated::user_update))
        .route("/change-status/:id", patch(elevated::class_status))
        .route("/admin-stats", get(elevated::admin_stats))
        .route_layer(from_fn_with_state(state.clone(), require_admin))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn instructor_routes(state: AppState) -> Router<AppState> {
    use handlers::elevated;

    Router::new()
        .route("/new-class", post(elevated::class_post))
        .route("/classes/:email", get(elevated::instructor_classes))
        .route("/update-class/:id", put(elevated::class_update))
        .route_layer(from_fn_with_state(state.clone(), require_instructor))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
