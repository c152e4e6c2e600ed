pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod types;
pub mod validation;

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    middleware::from_fn,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use database::DocumentStore;
use middleware::jwt_auth_middleware;
use services::{AuthService, BodyMetricsService, UsersService};

/// Shared service handles behind every route.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UsersService>,
    pub metrics: Arc<BodyMetricsService>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let users = Arc::new(UsersService::users(store.clone()));
        let metrics = Arc::new(BodyMetricsService::body_metrics(store));
        let auth = Arc::new(AuthService::new(users.clone()));
        Self {
            users,
            metrics,
            auth,
        }
    }
}

/// Build the application router: `/health` at the root for probes,
/// everything else under `/api`, with the JWT guard wrapped around the
/// protected group only.
pub fn app(state: AppState) -> Router {
    let api = public_routes().merge(protected_routes().layer(from_fn(jwt_auth_middleware)));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use handlers::public::{auth, users};

    Router::new()
        .route("/auth/login", post(auth::login_post))
        .route("/users", post(users::user_register).get(users::users_list))
        .route("/users/:id", get(users::user_show))
}

fn protected_routes() -> Router<AppState> {
    use handlers::protected::{auth, metrics, users};

    Router::new()
        .route("/auth/whoami", get(auth::whoami_get))
        .route(
            "/users/:id",
            patch(users::user_update).delete(users::user_remove),
        )
        .route("/users/disable/:id", patch(users::user_disable))
        .route("/metrics", post(metrics::metrics_create))
        .route(
            "/metrics/:id",
            get(metrics::metrics_history)
                .patch(metrics::metrics_update)
                .delete(metrics::metrics_remove),
        )
        .route("/metrics/detail/:id", get(metrics::metrics_detail))
}

/// CORS honoring `CLIENT_URL` when set, permissive otherwise. The method
/// list matches what browser clients of this API use.
fn cors_layer() -> CorsLayer {
    let methods = [
        Method::GET,
        Method::HEAD,
        Method::PUT,
        Method::PATCH,
        Method::POST,
        Method::DELETE,
    ];

    match &config::config().server.client_url {
        Some(origin) => match origin.parse::<HeaderValue>() {
            Ok(origin) => CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(methods)
                .allow_headers(Any),
            Err(_) => {
                tracing::warn!(client_url = %origin, "CLIENT_URL is not a valid origin, allowing any");
                CorsLayer::permissive()
            }
        },
        None => CorsLayer::permissive(),
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}
