//! Article endpoints, including the multipart post form.

use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State, multipart::MultipartError},
    http::StatusCode,
    routing::{get, post},
};
use matrix_common::{AppError, AppResult, PageRequest, Paged};
use matrix_core::{ArticleView, CreateArticleInput, ToggleResult, UploadInput};
use matrix_db::entities::article;
use serde::{Deserialize, Serialize};

use crate::{
    endpoints::PageQuery,
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Feed query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// Only this person's articles.
    pub author_id: Option<String>,
}

/// A single article plus the caller's flags on it.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub view: ArticleView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_praised: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_collected: Option<bool>,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// Collect hashtag ids sent either as repeated fields or comma-separated.
fn push_hashtag_ids(target: &mut Vec<String>, value: &str) {
    target.extend(
        value
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(ToString::to_string),
    );
}

/// `POST /CreatePost/Create` with fields `content`, `files` and `hashtagIds`.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<ArticleView>> {
    let mut input = CreateArticleInput::default();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "content" => {
                input.content = field.text().await.map_err(multipart_error)?;
            }
            "hashtagIds" | "hashtagIds[]" => {
                let value = field.text().await.map_err(multipart_error)?;
                push_hashtag_ids(&mut input.hashtag_ids, &value);
            }
            "files" | "files[]" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(multipart_error)?;

                // Browsers send an empty part when no file was chosen
                if data.is_empty() {
                    continue;
                }

                files.push(UploadInput {
                    file_name,
                    content_type,
                    data,
                });
            }
            _ => {}
        }
    }

    let article = state
        .article_service
        .create_article(&user.person_id, input, files)
        .await?;
    Ok(ApiResponse::created(article))
}

async fn feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> AppResult<ApiResponse<Paged<ArticleView>>> {
    let page = PageRequest::from_query(query.page, query.page_size);
    let articles = match query.author_id {
        Some(author_id) => state.article_service.get_by_author(&author_id, page).await?,
        None => state.article_service.get_feed(page).await?,
    };
    Ok(ApiResponse::ok(articles))
}

async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ArticleDetail>> {
    let view = state
        .article_service
        .get_article(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Article {id} not found")))?;

    let (is_praised, is_collected) = match viewer {
        Some(viewer) => {
            let flags = state
                .praise_collect_service
                .get_state(&viewer.person_id, &id)
                .await?;
            (
                Some(flags.as_ref().is_some_and(|f| f.is_praised)),
                Some(flags.as_ref().is_some_and(|f| f.is_collected)),
            )
        }
        None => (None, None),
    };

    Ok(ApiResponse::ok(ArticleDetail {
        view,
        is_praised,
        is_collected,
    }))
}

async fn delete_article(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state
        .article_service
        .delete_article(&id, &user.person_id, user.is_admin())
        .await?;
    Ok(no_content())
}

async fn praise(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ToggleResult>> {
    let result = state
        .praise_collect_service
        .toggle_praise(&user.person_id, &id)
        .await?;
    Ok(ApiResponse::ok(result))
}

async fn collect(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ToggleResult>> {
    let result = state
        .praise_collect_service
        .toggle_collect(&user.person_id, &id)
        .await?;
    Ok(ApiResponse::ok(result))
}

/// The caller's collected articles.
async fn collected(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Paged<article::Model>>> {
    let articles = state
        .praise_collect_service
        .get_collected_articles(&user.person_id, query.page_request())
        .await?;
    Ok(ApiResponse::ok(articles))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(feed))
        .route("/collected", get(collected))
        .route("/{id}", get(show).delete(delete_article))
        .route("/{id}/praise", post(praise))
        .route("/{id}/collect", post(collect))
}

/// The post form lives outside `/api`. `body_limit` bounds the whole
/// multipart body.
pub fn create_post_router(body_limit: usize) -> Router<AppState> {
    Router::new().route(
        "/CreatePost/Create",
        post(create).layer(DefaultBodyLimit::max(body_limit)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_hashtag_ids() {
        let mut ids = Vec::new();
        push_hashtag_ids(&mut ids, "h1, h2,,");
        push_hashtag_ids(&mut ids, "h3");
        assert_eq!(ids, vec!["h1", "h2", "h3"]);
    }
}
