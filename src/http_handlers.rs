// src/http_handlers.rs
use super::{
    error::AppError,
    filter::ConfigurationFilter,
    types::{
        ConfigurationPayload, RestoreSavedStatePayload, SavedState, Target, User, UserConfiguration,
        UserPayload, VersionSummary,
    },
    ServerState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json as AxumJson,
};
use tracing::info;

type JsonResult<T> = Result<AxumJson<T>, AppError>;

// ==============================================================================
// Users
// ==============================================================================

pub async fn list_users_handler(State(state): State<ServerState>) -> JsonResult<Vec<User>> {
    Ok(AxumJson(state.repository.list_users().await?))
}

pub async fn create_user_handler(
    State(state): State<ServerState>,
    AxumJson(payload): AxumJson<UserPayload>,
) -> Result<(StatusCode, AxumJson<User>), AppError> {
    payload.validate().map_err(AppError::BadRequest)?;
    let user = state.repository.add_user(&payload).await?;
    Ok((StatusCode::CREATED, AxumJson(user)))
}

pub async fn get_user_handler(State(state): State<ServerState>, Path(user_id): Path<i64>) -> JsonResult<User> {
    Ok(AxumJson(state.repository.get_user(user_id).await?))
}

pub async fn update_user_handler(
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
    AxumJson(payload): AxumJson<UserPayload>,
) -> JsonResult<User> {
    payload.validate().map_err(AppError::BadRequest)?;
    Ok(AxumJson(state.repository.update_user(user_id, &payload).await?))
}

pub async fn delete_user_handler(State(state): State<ServerState>, Path(user_id): Path<i64>) -> JsonResult<User> {
    Ok(AxumJson(state.repository.remove_user(user_id).await?))
}

// ==============================================================================
// Configurations
// ==============================================================================

pub async fn list_configurations_handler(
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
    Query(filter): Query<ConfigurationFilter>,
) -> JsonResult<Vec<UserConfiguration>> {
    Ok(AxumJson(state.repository.list_configurations(user_id, &filter).await?))
}

pub async fn create_configuration_handler(
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
    AxumJson(payload): AxumJson<ConfigurationPayload>,
) -> Result<(StatusCode, AxumJson<UserConfiguration>), AppError> {
    payload.validate().map_err(AppError::BadRequest)?;
    let configuration = state.repository.create_configuration(user_id, &payload).await?;
    Ok((StatusCode::CREATED, AxumJson(configuration)))
}

pub async fn get_configuration_handler(
    State(state): State<ServerState>,
    Path((user_id, configuration_id)): Path<(i64, i64)>,
) -> JsonResult<UserConfiguration> {
    Ok(AxumJson(state.repository.get_configuration(user_id, configuration_id).await?))
}

pub async fn update_configuration_handler(
    State(state): State<ServerState>,
    Path((user_id, configuration_id)): Path<(i64, i64)>,
    AxumJson(payload): AxumJson<ConfigurationPayload>,
) -> JsonResult<UserConfiguration> {
    payload.validate().map_err(AppError::BadRequest)?;
    let configuration = state
        .repository
        .update_configuration(user_id, configuration_id, &payload)
        .await?;
    Ok(AxumJson(configuration))
}

pub async fn delete_configuration_handler(
    State(state): State<ServerState>,
    Path((user_id, configuration_id)): Path<(i64, i64)>,
) -> JsonResult<UserConfiguration> {
    Ok(AxumJson(state.repository.remove_configuration(user_id, configuration_id).await?))
}

/// History overview: saved-state timestamps plus which one "restore last" uses.
pub async fn configuration_versions_handler(
    State(state): State<ServerState>,
    Path((user_id, configuration_id)): Path<(i64, i64)>,
) -> JsonResult<VersionSummary> {
    let versioned = state
        .repository
        .versioned_configuration(user_id, configuration_id)
        .await?;
    Ok(AxumJson(VersionSummary {
        name: versioned.name().to_string(),
        text_options: versioned.current_state(),
        created_at: versioned.created_at(),
        modified_at: versioned.modified_at(),
        save_pointer: versioned.save_pointer(),
        versions: versioned.version_times(),
    }))
}

// ==============================================================================
// Saved states
// ==============================================================================

pub async fn list_saved_states_handler(
    State(state): State<ServerState>,
    Path((user_id, configuration_id)): Path<(i64, i64)>,
) -> JsonResult<Vec<SavedState>> {
    Ok(AxumJson(state.repository.list_saved_states(user_id, configuration_id).await?))
}

pub async fn get_saved_state_handler(
    State(state): State<ServerState>,
    Path((user_id, configuration_id, saved_state_id)): Path<(i64, i64, i64)>,
) -> JsonResult<SavedState> {
    let saved = state
        .repository
        .get_saved_state(user_id, configuration_id, saved_state_id)
        .await?;
    Ok(AxumJson(saved))
}

pub async fn delete_saved_state_handler(
    State(state): State<ServerState>,
    Path((user_id, configuration_id, saved_state_id)): Path<(i64, i64, i64)>,
) -> JsonResult<SavedState> {
    let removed = state
        .repository
        .remove_saved_state(user_id, configuration_id, saved_state_id)
        .await?;
    Ok(AxumJson(removed))
}

pub async fn save_state_handler(
    State(state): State<ServerState>,
    Path((user_id, configuration_id)): Path<(i64, i64)>,
) -> JsonResult<SavedState> {
    let saved = state.repository.save_state(user_id, configuration_id).await?;
    info!("💾 [HTTP] Saved state #{} of configuration #{}", saved.id, configuration_id);
    Ok(AxumJson(saved))
}

pub async fn restore_last_saved_state_handler(
    State(state): State<ServerState>,
    Path((user_id, configuration_id)): Path<(i64, i64)>,
) -> JsonResult<UserConfiguration> {
    let configuration = state
        .repository
        .restore_last_saved_state(user_id, configuration_id)
        .await?;
    Ok(AxumJson(configuration))
}

pub async fn restore_specific_saved_state_handler(
    State(state): State<ServerState>,
    Path((user_id, configuration_id)): Path<(i64, i64)>,
    AxumJson(payload): AxumJson<RestoreSavedStatePayload>,
) -> JsonResult<UserConfiguration> {
    let configuration = state
        .repository
        .restore_saved_state(user_id, configuration_id, payload.saved_state_id)
        .await?;
    Ok(AxumJson(configuration))
}

// ==============================================================================
// Subscriptions (read-only view of the registry)
// ==============================================================================

pub async fn list_clients_handler(State(state): State<ServerState>) -> AxumJson<Vec<String>> {
    AxumJson(state.registry.list_clients().await)
}

pub async fn client_subscriptions_handler(
    State(state): State<ServerState>,
    Path(client_id): Path<String>,
) -> JsonResult<Vec<Target>> {
    Ok(AxumJson(state.registry.list_subscriptions(&client_id).await?))
}
