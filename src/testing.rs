//! In-memory collaborators for unit and router tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    articles::{
        query::{ArticleQuery, Order, Predicate},
        repo::ArticleStore,
        repo_types::{Article, NewArticle},
    },
    auth::{repo::UserStore, repo_types::User},
    cache::ArticleCache,
};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, email: &str, password_hash: &str) -> anyhow::Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email) {
            return Ok(None);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(Some(user))
    }
}

#[derive(Default)]
pub struct MemoryArticleStore {
    rows: Mutex<HashMap<Uuid, Article>>,
    saves: AtomicUsize,
    fail: bool,
}

impl MemoryArticleStore {
    /// Every call fails like a dropped database connection.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn insert_at(&self, author_id: Uuid, created_at: OffsetDateTime) -> Article {
        let article = Article {
            id: Uuid::new_v4(),
            title: format!("Article {created_at}"),
            description: "seeded".into(),
            author_id,
            created_at,
            updated_at: created_at,
        };
        self.rows.lock().unwrap().insert(article.id, article.clone());
        article
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("connection refused");
        }
        Ok(())
    }
}

fn predicate_holds(p: &Predicate, a: &Article) -> bool {
    match *p {
        Predicate::AuthorEquals(id) => a.author_id == id,
        Predicate::CreatedWithin { from, to } => {
            from.map_or(true, |f| a.created_at >= f) && to.map_or(true, |t| a.created_at <= t)
        }
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn create(&self, new: NewArticle) -> anyhow::Result<Article> {
        self.check()?;
        let now = OffsetDateTime::now_utc();
        let article = Article {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            author_id: new.author_id,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().insert(article.id, article.clone());
        Ok(article)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Article>> {
        self.check()?;
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn find_and_count(&self, query: &ArticleQuery) -> anyhow::Result<(Vec<Article>, i64)> {
        self.check()?;
        let rows = self.rows.lock().unwrap();
        let mut hits: Vec<Article> = rows
            .values()
            .filter(|a| query.predicates.iter().all(|p| predicate_holds(p, a)))
            .cloned()
            .collect();
        match query.order {
            Order::CreatedDesc => {
                hits.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)))
            }
        }
        let total = hits.len() as i64;
        let page = hits
            .into_iter()
            .skip(query.skip as usize)
            .take(query.take as usize)
            .collect();
        Ok((page, total))
    }

    async fn save(&self, article: &Article) -> anyhow::Result<Option<Article>> {
        self.check()?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.get_mut(&article.id) else {
            return Ok(None);
        };
        row.title = article.title.clone();
        row.description = article.description.clone();
        row.updated_at = OffsetDateTime::now_utc();
        Ok(Some(row.clone()))
    }

    async fn delete_by_id(&self, id: Uuid) -> anyhow::Result<()> {
        self.check()?;
        self.rows.lock().unwrap().remove(&id);
        Ok(())
    }
}

/// Cache that remembers nothing and counts clears.
#[derive(Default)]
pub struct CountingCache {
    clears: AtomicUsize,
}

impl CountingCache {
    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArticleCache for CountingCache {
    async fn get(&self, _key: &str) -> anyhow::Result<Option<Value>> {
        Ok(None)
    }
    async fn put(&self, _key: &str, _value: Value) -> anyhow::Result<()> {
        Ok(())
    }
    async fn clear_all(&self) -> anyhow::Result<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Cache whose backend is unreachable.
pub struct BrokenCache;

#[async_trait]
impl ArticleCache for BrokenCache {
    async fn get(&self, _key: &str) -> anyhow::Result<Option<Value>> {
        anyhow::bail!("cache timeout")
    }
    async fn put(&self, _key: &str, _value: Value) -> anyhow::Result<()> {
        anyhow::bail!("cache timeout")
    }
    async fn clear_all(&self) -> anyhow::Result<()> {
        anyhow::bail!("cache timeout")
    }
}

pub struct PanickingCache;

#[async_trait]
impl ArticleCache for PanickingCache {
    async fn get(&self, _key: &str) -> anyhow::Result<Option<Value>> {
        Ok(None)
    }
    async fn put(&self, _key: &str, _value: Value) -> anyhow::Result<()> {
        Ok(())
    }
    async fn clear_all(&self) -> anyhow::Result<()> {
        panic!("cache client bug")
    }
}

/// Drive `app` with one request and decode the JSON body (`Null` if none).
pub async fn call(
    app: &axum::Router,
    req: axum::http::Request<axum::body::Body>,
) -> (axum::http::StatusCode, Value) {
    use tower::ServiceExt;

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

pub fn json_request(
    method: axum::http::Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> axum::http::Request<axum::body::Body> {
    use axum::http::header;

    let mut req = axum::http::Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap(),
        None => req.body(axum::body::Body::empty()).unwrap(),
    }
}
