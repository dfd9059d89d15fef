use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        OriginalUri, Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use tracing::instrument;

use crate::{
    articles::{
        dto::{CreateArticleRequest, ListArticlesQuery, UpdateArticleRequest},
        repo_types::Article,
    },
    auth::jwt::AuthUser,
    cache::read_through,
    error::AppError,
    state::AppState,
    validation::parse_id,
};

pub fn article_routes() -> Router<AppState> {
    Router::new()
        .route("/articles", get(list_articles).post(create_article))
        .route(
            "/articles/:id",
            get(get_article).patch(update_article).delete(delete_article),
        )
}

fn cache_key(uri: &OriginalUri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

#[instrument(skip(state, claims, body), fields(user_id = %claims.user_id))]
pub async fn create_article(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    body: Result<Json<CreateArticleRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    body.validate()?;
    let article = state
        .articles
        .create(claims.user_id, body.title, body.description)
        .await?;
    let location = format!("/api/articles/{}", article.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(article)))
}

#[instrument(skip(state, query))]
pub async fn list_articles(
    State(state): State<AppState>,
    uri: OriginalUri,
    query: Result<Query<ListArticlesQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(query) = query?;
    let filter = query.into_filter()?;

    let page = read_through(&*state.cache, &cache_key(&uri), || {
        state.articles.list(&filter)
    })
    .await?;
    Ok(Json(page))
}

#[instrument(skip(state))]
pub async fn get_article(
    State(state): State<AppState>,
    uri: OriginalUri,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    let article = read_through(&*state.cache, &cache_key(&uri), || state.articles.get(id)).await?;
    Ok(Json(article))
}

#[instrument(skip(state, claims, body), fields(user_id = %claims.user_id))]
pub async fn update_article(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    body: Result<Json<UpdateArticleRequest>, JsonRejection>,
) -> Result<Json<Article>, AppError> {
    let id = parse_id(&id)?;
    let Json(body) = body?;
    let patch = body.into_patch()?;
    let article = state.articles.update(id, claims.user_id, patch).await?;
    Ok(Json(article))
}

#[instrument(skip(state, claims), fields(user_id = %claims.user_id))]
pub async fn delete_article(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Article>, AppError> {
    let id = parse_id(&id)?;
    let article = state.articles.delete(id, claims.user_id).await?;
    Ok(Json(article))
}
