use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    articles::{
        guard::assert_owner,
        query::{ArticleFilter, ArticleQuery},
        repo::ArticleStore,
        repo_types::{Article, ArticlePatch, NewArticle},
    },
    cache::{invalidate_all, ArticleCache},
    error::AppError,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

/// Author-scoped article operations.
///
/// Inputs are expected to be validated by the caller (lengths, page bounds).
/// Update and delete read the row, check ownership, then write without a
/// version check, so a concurrent writer in between wins or loses silently.
pub struct ArticleService {
    articles: Arc<dyn ArticleStore>,
    cache: Arc<dyn ArticleCache>,
}

impl ArticleService {
    pub fn new(articles: Arc<dyn ArticleStore>, cache: Arc<dyn ArticleCache>) -> Self {
        Self { articles, cache }
    }

    #[instrument(skip(self, title, description))]
    pub async fn create(
        &self,
        author_id: Uuid,
        title: String,
        description: String,
    ) -> Result<Article, AppError> {
        info!(%title, "creating article");
        let article = self
            .articles
            .create(NewArticle {
                title,
                description,
                author_id,
            })
            .await?;
        invalidate_all(self.cache.clone()).await;
        info!(article_id = %article.id, "article created");
        Ok(article)
    }

    pub async fn list(&self, filter: &ArticleFilter) -> Result<Paginated<Article>, AppError> {
        let query = ArticleQuery::build(filter);
        let (data, total) = self.articles.find_and_count(&query).await?;
        Ok(Paginated {
            data,
            total,
            page: query.page,
            limit: query.limit,
            total_pages: query.total_pages(total),
        })
    }

    pub async fn get(&self, id: Uuid) -> Result<Article, AppError> {
        self.articles.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: Uuid,
        acting_user: Uuid,
        patch: ArticlePatch,
    ) -> Result<Article, AppError> {
        let mut article = self.load_for_write(id).await?;
        assert_owner(&article, acting_user)?;

        patch.apply(&mut article);
        let saved = self.articles.save(&article).await?.ok_or_else(|| {
            warn!(article_id = %id, "article vanished before update was written");
            AppError::NotFound
        })?;
        invalidate_all(self.cache.clone()).await;
        info!(article_id = %id, "article updated");
        Ok(saved)
    }

    /// Returns the article as it was before deletion.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid, acting_user: Uuid) -> Result<Article, AppError> {
        let article = self.load_for_write(id).await?;
        assert_owner(&article, acting_user)?;

        self.articles.delete_by_id(id).await?;
        invalidate_all(self.cache.clone()).await;
        info!(article_id = %id, "article deleted");
        Ok(article)
    }

    async fn load_for_write(&self, id: Uuid) -> Result<Article, AppError> {
        self.articles.find_by_id(id).await?.ok_or_else(|| {
            warn!(article_id = %id, "article not found for write");
            AppError::NotFound
        })
    }
}
