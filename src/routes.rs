// src/routes.rs
use super::{http_handlers, ServerState};
use axum::{
    routing::{get, patch},
    Router,
};
use http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

const CONFIGURATION: &str = "/api/v1/users/{user_id}/configurations/{configuration_id}";

pub fn create_router(state: ServerState) -> Router {
    let cors = cors_layer(state.config.allowed_origin.as_deref());

    Router::new()
        .route(
            "/api/v1/users",
            get(http_handlers::list_users_handler).post(http_handlers::create_user_handler),
        )
        .route(
            "/api/v1/users/{user_id}",
            get(http_handlers::get_user_handler)
                .patch(http_handlers::update_user_handler)
                .delete(http_handlers::delete_user_handler),
        )
        .route(
            "/api/v1/users/{user_id}/configurations",
            get(http_handlers::list_configurations_handler).post(http_handlers::create_configuration_handler),
        )
        .route(
            CONFIGURATION,
            get(http_handlers::get_configuration_handler)
                .patch(http_handlers::update_configuration_handler)
                .delete(http_handlers::delete_configuration_handler),
        )
        .route(
            &format!("{CONFIGURATION}/versions"),
            get(http_handlers::configuration_versions_handler),
        )
        .route(
            &format!("{CONFIGURATION}/saved-states"),
            get(http_handlers::list_saved_states_handler),
        )
        .route(
            &format!("{CONFIGURATION}/saved-states/{{saved_state_id}}"),
            get(http_handlers::get_saved_state_handler).delete(http_handlers::delete_saved_state_handler),
        )
        .route(
            &format!("{CONFIGURATION}/save-state"),
            patch(http_handlers::save_state_handler),
        )
        .route(
            &format!("{CONFIGURATION}/restore-last-saved-state"),
            patch(http_handlers::restore_last_saved_state_handler),
        )
        .route(
            &format!("{CONFIGURATION}/restore-specific-saved-state"),
            patch(http_handlers::restore_specific_saved_state_handler),
        )
        .route("/api/v1/subscriptions/clients", get(http_handlers::list_clients_handler))
        .route(
            "/api/v1/subscriptions/clients/{client_id}",
            get(http_handlers::client_subscriptions_handler),
        )
        .with_state(state)
        .layer(cors)
}

fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match allowed_origin.map(str::parse::<HeaderValue>) {
        Some(Ok(origin)) => cors.allow_origin(origin),
        Some(Err(e)) => {
            warn!("⚠️ [CORS] Ignoring invalid origin ({}), allowing any.", e);
            cors.allow_origin(Any)
        }
        None => cors.allow_origin(Any),
    }
}
