//! User management endpoints

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::{NewUser, User, UserPatch};

/// Header carrying the total record count on list responses
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Create the `/user` router
pub fn create_users_router() -> Router<AppState> {
    Router::new()
        .route(
            "/user",
            get(list_users)
                .post(create_user)
                .put(update_users)
                .delete(delete_users),
        )
        .route(
            "/user/{username}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// Partial update body
///
/// `username` is accepted so clients that echo the whole record back do not
/// fail, but it is never applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserApiRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub last_name: Option<Option<String>>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

/// Absent field -> `None`, explicit `null` -> `Some(None)`
fn deserialize_nullable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

impl From<UpdateUserApiRequest> for UserPatch {
    fn from(request: UpdateUserApiRequest) -> Self {
        Self {
            password: request.password,
            first_name: request.first_name,
            last_name: request.last_name,
            last_login: request.last_login,
        }
    }
}

/// Bulk update body: the same fields applied to every listed user
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUsersApiRequest {
    pub usernames: Vec<String>,
    #[serde(default)]
    pub fields: UpdateUserApiRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateUsersResponse {
    pub updated: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteUserResponse {
    pub deleted: bool,
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteUsersResponse {
    pub deleted: u64,
}

/// GET /api/user
///
/// Query parameters are accepted for client compatibility and ignored.
/// `X-Total-Count` comes from a separate count query and is best-effort: a
/// write landing between the two reads can make it differ from the array
/// length.
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    debug!(params = ?params, "Listing users");

    let users = state.user_service.find().await?;
    let total = state.user_service.count().await?;

    Ok(([(TOTAL_COUNT_HEADER, total.to_string())], Json(users)))
}

/// POST /api/user
pub async fn create_user(
    State(state): State<AppState>,
    Json(candidate): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    debug!(username = %candidate.username, "Creating user");

    let user = state.user_service.create(candidate).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/user/{username}
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<User>, ApiError> {
    debug!(username = %username, "Getting user");

    let user = state.user_service.find_one(&username).await?;

    Ok(Json(user))
}

/// PUT /api/user/{username}
pub async fn update_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(request): Json<UpdateUserApiRequest>,
) -> Result<Json<User>, ApiError> {
    if let Some(requested) = request.username.as_deref().filter(|r| *r != username) {
        debug!(username = %username, requested = %requested, "Ignoring username change");
    }

    let user = state
        .user_service
        .update(&username, UserPatch::from(request))
        .await?;

    Ok(Json(user))
}

/// PUT /api/user
pub async fn update_users(
    State(state): State<AppState>,
    Json(request): Json<UpdateUsersApiRequest>,
) -> Result<Json<UpdateUsersResponse>, ApiError> {
    if request.usernames.is_empty() {
        return Err(ApiError::bad_request("usernames cannot be empty"));
    }

    debug!(count = request.usernames.len(), "Bulk updating users");

    let updated = state
        .user_service
        .update_many(&request.usernames, UserPatch::from(request.fields))
        .await?;

    Ok(Json(UpdateUsersResponse { updated }))
}

/// DELETE /api/user/{username}
pub async fn delete_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<DeleteUserResponse>, ApiError> {
    debug!(username = %username, "Deleting user");

    state.user_service.delete_one(&username).await?;

    Ok(Json(DeleteUserResponse {
        deleted: true,
        username,
    }))
}

/// DELETE /api/user
pub async fn delete_users(
    State(state): State<AppState>,
    Json(usernames): Json<Vec<String>>,
) -> Result<Json<DeleteUsersResponse>, ApiError> {
    debug!(count = usernames.len(), "Bulk deleting users");

    let deleted = state.user_service.delete(&usernames).await?;

    Ok(Json(DeleteUsersResponse { deleted }))
}
