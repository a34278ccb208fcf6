//! Person profile and follow endpoints.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use matrix_common::{AppError, AppResult, Paged};
use matrix_core::UpdateProfileInput;
use matrix_db::entities::{follow, nft, person};
use serde::Serialize;

use crate::{
    endpoints::PageQuery,
    extractors::{AuthUser, CurrentUser, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Profile with relationship counts.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonProfile {
    #[serde(flatten)]
    pub person: person::Model,
    pub followers_count: u64,
    pub following_count: u64,
    /// Whether the caller follows this person. Absent for guests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_following: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IsFollowingResponse {
    pub is_following: bool,
}

/// Replace a page of person IDs with the persons, keeping order.
/// Persons deleted meanwhile are dropped from the page.
pub(crate) async fn hydrate_persons(
    state: &AppState,
    ids: Paged<String>,
) -> AppResult<Paged<person::Model>> {
    let mut found: HashMap<String, person::Model> = state
        .person_service
        .find_by_ids(&ids.items)
        .await?
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();

    let items = ids.items.iter().filter_map(|id| found.remove(id)).collect();

    Ok(Paged {
        items,
        page: ids.page,
        page_size: ids.page_size,
        total: ids.total,
    })
}

async fn find_person(state: &AppState, id: &str) -> AppResult<person::Model> {
    state
        .person_service
        .get_person(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Person {id} not found")))
}

/// Private profiles show their follow lists to themselves and friends only.
async fn ensure_lists_visible(
    state: &AppState,
    viewer: Option<&CurrentUser>,
    person: &person::Model,
) -> AppResult<()> {
    if !person.is_private {
        return Ok(());
    }

    let Some(viewer) = viewer else {
        return Err(AppError::Forbidden("This profile is private".to_string()));
    };

    if viewer.person_id == person.id
        || state
            .friendship_service
            .are_friends(&viewer.person_id, &person.id)
            .await?
    {
        return Ok(());
    }

    Err(AppError::Forbidden("This profile is private".to_string()))
}

async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PersonProfile>> {
    let person = find_person(&state, &id).await?;

    let (followers_count, following_count) = tokio::try_join!(
        state.follow_service.count_followers(&id),
        state.follow_service.count_following(&id),
    )?;

    let is_following = match viewer {
        Some(viewer) if viewer.person_id != id => Some(
            state
                .follow_service
                .is_following(&viewer.person_id, &id)
                .await?,
        ),
        _ => None,
    };

    Ok(ApiResponse::ok(PersonProfile {
        person,
        followers_count,
        following_count,
        is_following,
    }))
}

async fn update_me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<person::Model>> {
    let person = state
        .person_service
        .update_profile(&user.person_id, req)
        .await?;
    Ok(ApiResponse::ok(person))
}

async fn nfts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<nft::Model>>> {
    let nfts = state.nft_service.list_for_person(&id).await?;
    Ok(ApiResponse::ok(nfts))
}

async fn follow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<follow::Model>> {
    let edge = state
        .follow_service
        .follow_user(&user.person_id, &id)
        .await?;
    Ok(ApiResponse::ok(edge))
}

async fn unfollow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<axum::http::StatusCode> {
    state
        .follow_service
        .unfollow_user(&user.person_id, &id)
        .await?;
    Ok(no_content())
}

async fn followers(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Paged<person::Model>>> {
    let person = find_person(&state, &id).await?;
    ensure_lists_visible(&state, viewer.as_ref(), &person).await?;

    let ids = state
        .follow_service
        .get_followers(&id, query.page_request())
        .await?;
    Ok(ApiResponse::ok(hydrate_persons(&state, ids).await?))
}

async fn following(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Paged<person::Model>>> {
    let person = find_person(&state, &id).await?;
    ensure_lists_visible(&state, viewer.as_ref(), &person).await?;

    let ids = state
        .follow_service
        .get_following(&id, query.page_request())
        .await?;
    Ok(ApiResponse::ok(hydrate_persons(&state, ids).await?))
}

async fn is_following(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<IsFollowingResponse>> {
    let is_following = state
        .follow_service
        .is_following(&user.person_id, &id)
        .await?;
    Ok(ApiResponse::ok(IsFollowingResponse { is_following }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", put(update_me))
        .route("/{id}", get(show))
        .route("/{id}/nfts", get(nfts))
        .route("/{id}/follow", post(follow).delete(unfollow))
        .route("/{id}/followers", get(followers))
        .route("/{id}/following", get(following))
        .route("/{id}/is-following", get(is_following))
}
