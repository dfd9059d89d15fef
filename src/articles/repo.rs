use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::articles::{
    query::{ArticleQuery, Order, Predicate},
    repo_types::{Article, NewArticle},
};

const ARTICLE_COLUMNS: &str = "id, title, description, author_id, created_at, updated_at";

/// Article store consumed by the article service.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn create(&self, new: NewArticle) -> anyhow::Result<Article>;

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Article>>;

    /// One page of matches plus the total number of matches.
    async fn find_and_count(&self, query: &ArticleQuery) -> anyhow::Result<(Vec<Article>, i64)>;

    /// Persist title and description and bump `updated_at`. `None` if the
    /// row is gone.
    async fn save(&self, article: &Article) -> anyhow::Result<Option<Article>>;

    async fn delete_by_id(&self, id: Uuid) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgArticleStore {
    db: PgPool,
}

impl PgArticleStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn push_where(qb: &mut QueryBuilder<'_, Postgres>, predicates: &[Predicate]) {
    for (i, p) in predicates.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        match *p {
            Predicate::AuthorEquals(author_id) => {
                qb.push("author_id = ").push_bind(author_id);
            }
            Predicate::CreatedWithin { from, to } => match (from, to) {
                (Some(from), Some(to)) => {
                    qb.push("created_at BETWEEN ")
                        .push_bind(from)
                        .push(" AND ")
                        .push_bind(to);
                }
                (Some(from), None) => {
                    qb.push("created_at >= ").push_bind(from);
                }
                (None, Some(to)) => {
                    qb.push("created_at <= ").push_bind(to);
                }
                (None, None) => {
                    qb.push("TRUE");
                }
            },
        }
    }
}

pub(crate) fn count_query(query: &ArticleQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM articles");
    push_where(&mut qb, &query.predicates);
    qb
}

pub(crate) fn page_query(query: &ArticleQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {ARTICLE_COLUMNS} FROM articles"));
    push_where(&mut qb, &query.predicates);
    match query.order {
        // id breaks ties so pages stay stable
        Order::CreatedDesc => qb.push(" ORDER BY created_at DESC, id DESC"),
    };
    qb.push(" LIMIT ")
        .push_bind(query.take)
        .push(" OFFSET ")
        .push_bind(query.skip);
    qb
}

#[async_trait]
impl ArticleStore for PgArticleStore {
    async fn create(&self, new: NewArticle) -> anyhow::Result<Article> {
        let article = sqlx::query_as::<_, Article>(&format!(
            r#"
            INSERT INTO articles (title, description, author_id)
            VALUES ($1, $2, $3)
            RETURNING {ARTICLE_COLUMNS}
            "#
        ))
        .bind(new.title)
        .bind(new.description)
        .bind(new.author_id)
        .fetch_one(&self.db)
        .await
        .context("insert article")?;
        Ok(article)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find article by id")?;
        Ok(article)
    }

    async fn find_and_count(&self, query: &ArticleQuery) -> anyhow::Result<(Vec<Article>, i64)> {
        let total: i64 = count_query(query)
            .build_query_scalar::<i64>()
            .fetch_one(&self.db)
            .await
            .context("count articles")?;
        let rows = page_query(query)
            .build_query_as::<Article>()
            .fetch_all(&self.db)
            .await
            .context("list articles")?;
        Ok((rows, total))
    }

    async fn save(&self, article: &Article) -> anyhow::Result<Option<Article>> {
        let saved = sqlx::query_as::<_, Article>(&format!(
            r#"
            UPDATE articles
               SET title = $2, description = $3, updated_at = now()
             WHERE id = $1
            RETURNING {ARTICLE_COLUMNS}
            "#
        ))
        .bind(article.id)
        .bind(&article.title)
        .bind(&article.description)
        .fetch_optional(&self.db)
        .await
        .context("update article")?;
        Ok(saved)
    }

    async fn delete_by_id(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete article")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::articles::query::ArticleFilter;
    use time::macros::datetime;

    #[test]
    fn unfiltered_list_has_no_where_clause() {
        let q = ArticleQuery::build(&ArticleFilter::default());
        assert_eq!(count_query(&q).sql(), "SELECT COUNT(*) FROM articles");
        assert_eq!(
            page_query(&q).sql(),
            "SELECT id, title, description, author_id, created_at, updated_at FROM articles \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn filters_are_bound_not_inlined() {
        let author = Uuid::new_v4();
        let q = ArticleQuery::build(&ArticleFilter {
            author_id: Some(author),
            publish_date_from: Some(datetime!(2024-01-01 0:00 UTC)),
            publish_date_to: Some(datetime!(2024-12-31 0:00 UTC)),
            ..Default::default()
        });
        let sql = page_query(&q).sql().to_string();
        assert!(sql.contains("WHERE author_id = $1 AND created_at BETWEEN $2 AND $3"));
        assert!(sql.ends_with("LIMIT $4 OFFSET $5"));
        assert!(!sql.contains(&author.to_string()));
    }

    #[test]
    fn one_sided_ranges() {
        let from_only = ArticleQuery::build(&ArticleFilter {
            publish_date_from: Some(datetime!(2024-01-01 0:00 UTC)),
            ..Default::default()
        });
        assert_eq!(
            count_query(&from_only).sql(),
            "SELECT COUNT(*) FROM articles WHERE created_at >= $1"
        );

        let to_only = ArticleQuery::build(&ArticleFilter {
            publish_date_to: Some(datetime!(2024-12-31 0:00 UTC)),
            ..Default::default()
        });
        assert_eq!(
            count_query(&to_only).sql(),
            "SELECT COUNT(*) FROM articles WHERE created_at <= $1"
        );
    }
}
