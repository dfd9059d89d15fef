use tracing::warn;
use uuid::Uuid;

use crate::{articles::repo_types::Article, error::AppError};

/// Only the recorded author may mutate or delete an article.
pub fn assert_owner(article: &Article, acting_user: Uuid) -> Result<(), AppError> {
    if article.author_id != acting_user {
        warn!(
            user_id = %acting_user,
            article_id = %article.id,
            author_id = %article.author_id,
            "user attempted to modify an article owned by someone else"
        );
        return Err(AppError::NotOwner);
    }
    Ok(())
}
