use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::AuthGate;
use crate::database::Database;
use crate::handlers::{protected, public};

/// Shared state handed to every handler
#[derive(Clone, Debug)]
pub struct AppState {
    pub gate: AuthGate,
    pub database: Option<Database>,
}

impl AppState {
    pub fn new(gate: AuthGate) -> Self {
        Self { gate, database: None }
    }

    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }
}

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Protected
        .merge(auth_routes(&state.gate))
        // Global middleware
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes(gate: &AuthGate) -> Router<AppState> {
    use protected::auth;

    gate.protect(
        Router::new()
            .route("/api/auth/whoami", get(auth::session_whoami))
            .route("/api/auth/contacts", get(auth::session_contacts)),
    )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(parse_origins(origins))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

fn parse_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect()
}
