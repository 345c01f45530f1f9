use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    envelope::ApiResponse,
    error::ApiError,
    i18n::{Locale, Text},
    state::AppState,
    users::{
        dto::{CreateUserRequest, UpdateUserRequest},
        resource::UserResource,
        services,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(show_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<UserResource>>>, ApiError> {
    let users = services::list_users(&state).await?;
    let data: Vec<UserResource> = users.into_iter().map(UserResource::from).collect();
    Ok(Json(ApiResponse::ok(
        data,
        state.config.locale.text(Text::UsersListed),
    )))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<UserResource>>), ApiError> {
    let locale = state.config.locale;
    let Json(req) = payload.map_err(|e| malformed(locale, e))?;
    let user = services::create_user(&state, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(UserResource::from(user), locale.text(Text::UserCreated))),
    ))
}

#[instrument(skip(state))]
pub async fn show_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserResource>>, ApiError> {
    let locale = state.config.locale;
    let id = parse_id(locale, &id)?;
    let user = services::get_user(&state, id).await?;
    Ok(Json(ApiResponse::ok(UserResource::from(user), locale.text(Text::UserFetched))))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<UserResource>>, ApiError> {
    let locale = state.config.locale;
    let id = parse_id(locale, &id)?;
    let Json(req) = payload.map_err(|e| malformed(locale, e))?;
    let user = services::update_user(&state, id, req).await?;
    Ok(Json(ApiResponse::ok(UserResource::from(user), locale.text(Text::UserUpdated))))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let locale = state.config.locale;
    let id = parse_id(locale, &id)?;
    services::delete_user(&state, id).await?;
    Ok(Json(ApiResponse::done(locale.text(Text::UserDeleted))))
}

/// Ids that are not integers can never match a row.
fn parse_id(locale: Locale, raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::user_not_found(locale, raw))
}

fn malformed(locale: Locale, rejection: JsonRejection) -> ApiError {
    warn!(error = %rejection.body_text(), "rejected request body");
    ApiError::bad_request(locale, rejection.body_text())
}
