use std::{sync::Arc, time::Duration};

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{
    articles::{repo::PgArticleStore, services::ArticleService},
    auth::{jwt::JwtKeys, password::Argon2Hasher, repo::PgUserStore, services::AuthService},
    cache::{ArticleCache, MemoryCache},
    config::AppConfig,
};

#[derive(Clone)]
pub struct AppState {
    pub jwt: JwtKeys,
    pub auth: Arc<AuthService>,
    pub articles: Arc<ArticleService>,
    pub cache: Arc<dyn ArticleCache>,
}

impl AppState {
    pub fn new(config: &AppConfig, db: PgPool) -> Self {
        let jwt = JwtKeys::from(&config.jwt);
        let cache = Arc::new(MemoryCache::new(Duration::from_secs(config.cache_ttl_seconds)))
            as Arc<dyn ArticleCache>;

        let auth = Arc::new(AuthService::new(
            Arc::new(PgUserStore::new(db.clone())),
            Arc::new(Argon2Hasher::new()),
            Arc::new(jwt.clone()),
        ));
        let articles = Arc::new(ArticleService::new(
            Arc::new(PgArticleStore::new(db)),
            cache.clone(),
        ));

        Self {
            jwt,
            auth,
            articles,
            cache,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::{
            config::JwtConfig,
            testing::{MemoryArticleStore, MemoryUserStore},
        };

        let jwt = JwtKeys::from(&JwtConfig {
            secret: "test".into(),
            issuer: "test".into(),
            audience: "test".into(),
            ttl_minutes: 5,
        });
        let cache = Arc::new(MemoryCache::new(Duration::from_secs(60))) as Arc<dyn ArticleCache>;

        let auth = Arc::new(AuthService::new(
            Arc::new(MemoryUserStore::default()),
            Arc::new(Argon2Hasher::fast()),
            Arc::new(jwt.clone()),
        ));
        let articles = Arc::new(ArticleService::new(
            Arc::new(MemoryArticleStore::default()),
            cache.clone(),
        ));

        Self {
            jwt,
            auth,
            articles,
            cache,
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}
