// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backend proxy routes.
//!
//! Handlers forward the caller's session token and map backend failures
//! through [`AppError`]'s response conversion.

use crate::error::{AppError, Result};
use crate::middleware::auth::SessionToken;
use crate::models::{Category, NewReview, Provider, ProviderQuery, Review, UserProfile, UserUpdate};
use crate::services::HeroImage;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Routes that need a session token.
/// The session middleware is applied in routes/mod.rs for these routes.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/user", get(get_user).patch(update_user))
        .route("/api/bookmarks", get(get_bookmarks))
        .route(
            "/api/bookmarks/{provider_id}",
            post(add_bookmark).delete(remove_bookmark),
        )
        .route("/api/reviews/{provider_id}", post(create_review))
        .route("/api/providers/{id}/hero-image", post(upload_hero_image))
}

/// Anonymous browsing routes.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/providers", get(search_providers))
        .route("/api/providers/{id}", get(get_provider))
        .route("/api/providers/{id}/reviews", get(get_reviews))
        .route("/api/categories", get(get_categories))
}

// ─── User Profile ────────────────────────────────────────────

async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<SessionToken>,
) -> Result<Json<UserProfile>> {
    let profile = state.backend.current_user(token.as_str()).await?;
    Ok(Json(profile))
}

/// Partial profile update. Only fields present in the body change.
async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<SessionToken>,
    Json(changes): Json<UserUpdate>,
) -> Result<Json<UserProfile>> {
    changes
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let profile = state.backend.update_user(token.as_str(), &changes).await?;
    tracing::info!(user_id = %profile.id, "Profile updated");
    Ok(Json(profile))
}

// ─── Bookmarks ───────────────────────────────────────────────

async fn get_bookmarks(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<SessionToken>,
) -> Result<Json<Vec<u64>>> {
    Ok(Json(state.backend.bookmark_ids(token.as_str()).await?))
}

async fn add_bookmark(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<SessionToken>,
    Path(provider_id): Path<u64>,
) -> Result<StatusCode> {
    state
        .backend
        .add_bookmark(token.as_str(), provider_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_bookmark(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<SessionToken>,
    Path(provider_id): Path<u64>,
) -> Result<StatusCode> {
    state
        .backend
        .remove_bookmark(token.as_str(), provider_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Providers ───────────────────────────────────────────────

async fn search_providers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProviderQuery>,
) -> Result<Json<Vec<Provider>>> {
    Ok(Json(state.catalog.search(&query).await?))
}

async fn get_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Provider>> {
    Ok(Json(state.catalog.provider(id).await?))
}

async fn get_reviews(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<Review>>> {
    Ok(Json(state.catalog.reviews(id).await?))
}

async fn create_review(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<SessionToken>,
    Path(provider_id): Path<u64>,
    Json(review): Json<NewReview>,
) -> Result<(StatusCode, Json<Review>)> {
    review
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let created = state
        .catalog
        .submit_review(token.as_str(), provider_id, &review)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_categories(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.catalog.categories().await?))
}

// ─── Hero Image ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct UploadParams {
    file_name: String,
}

#[derive(Serialize)]
struct UploadResponse {
    provider: Provider,
}

/// Raw image bytes in the body; the type comes from `Content-Type`.
async fn upload_hero_image(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<SessionToken>,
    Path(id): Path<u64>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadResponse>> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Content-Type header is required".to_string()))?;

    let image = HeroImage {
        file_name: params.file_name,
        content_type: content_type.to_string(),
        bytes: body.to_vec(),
    };

    let provider = state.uploader.upload(token.as_str(), id, image).await?;
    state.catalog.hero_image_changed(&provider)?;
    Ok(Json(UploadResponse { provider }))
}
