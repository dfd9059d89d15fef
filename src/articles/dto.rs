use serde::{Deserialize, Deserializer};
use time::{format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime};
use uuid::Uuid;

use crate::{
    articles::{
        query::{ArticleFilter, MAX_LIMIT},
        repo_types::ArticlePatch,
    },
    error::AppError,
    validation::{check_description, check_title},
};

#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    pub title: String,
    pub description: String,
}

impl CreateArticleRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        check_title(&self.title)?;
        check_description(&self.description)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl UpdateArticleRequest {
    pub fn into_patch(self) -> Result<ArticlePatch, AppError> {
        if let Some(title) = &self.title {
            check_title(title)?;
        }
        if let Some(description) = &self.description {
            check_description(description)?;
        }
        Ok(ArticlePatch {
            title: self.title,
            description: self.description,
        })
    }
}

/// `GET /articles` query string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListArticlesQuery {
    pub author_id: Option<Uuid>,
    #[serde(default, deserialize_with = "filter_date")]
    pub publish_date_from: Option<OffsetDateTime>,
    #[serde(default, deserialize_with = "filter_date")]
    pub publish_date_to: Option<OffsetDateTime>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListArticlesQuery {
    pub fn into_filter(self) -> Result<ArticleFilter, AppError> {
        if self.page == Some(0) {
            return Err(AppError::validation("page must be at least 1"));
        }
        if matches!(self.limit, Some(l) if l == 0 || l > MAX_LIMIT) {
            return Err(AppError::validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        Ok(ArticleFilter {
            author_id: self.author_id,
            publish_date_from: self.publish_date_from,
            publish_date_to: self.publish_date_to,
            page: self.page,
            limit: self.limit,
        })
    }
}

/// RFC 3339 timestamp, or a bare `YYYY-MM-DD` read as midnight UTC.
pub fn parse_filter_date(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(ts);
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|d| d.midnight().assume_utc())
}

fn filter_date<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => parse_filter_date(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {s}"))),
    }
}
