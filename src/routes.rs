// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{quiz, student},
    state::AppState,
    utils::jwt::{auth_middleware, student_middleware},
};

/// Assembles the main application router.
///
/// * Every route requires a student token: auth first, then the role check.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool, Config).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes))
        .route("/taken", get(quiz::list_taken_quizzes))
        .route("/{id}/next", get(quiz::next_question))
        .route("/{id}/answers", post(quiz::submit_answer))
        .route("/{id}/result", get(quiz::quiz_result));

    let student_routes = Router::new()
        .route("/", get(student::leaderboard))
        .route("/me", get(student::get_me))
        .route("/me/courses", put(student::update_courses));

    let api = Router::new()
        .nest("/quizzes", quiz_routes)
        .nest("/students", student_routes)
        // Layers run bottom-up: auth injects Claims before the role check reads them.
        .layer(middleware::from_fn(student_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
