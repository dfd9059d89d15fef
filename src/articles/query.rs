//! Translates list filters into a storage-neutral query description.
//!
//! The result is plain data: a conjunction of [`Predicate`]s, a pagination
//! window and a fixed order. Stores turn it into their native query form.

use time::OffsetDateTime;
use uuid::Uuid;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Optional, independently combinable list criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    pub author_id: Option<Uuid>,
    pub publish_date_from: Option<OffsetDateTime>,
    pub publish_date_to: Option<OffsetDateTime>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// One condition of the conjunction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// `author_id = id`
    AuthorEquals(Uuid),
    /// Inclusive bounds on the creation timestamp. At least one side is set.
    CreatedWithin {
        from: Option<OffsetDateTime>,
        to: Option<OffsetDateTime>,
    },
}

/// Newest first; the only order lists support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    CreatedDesc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleQuery {
    pub predicates: Vec<Predicate>,
    pub page: u32,
    pub limit: u32,
    pub skip: i64,
    pub take: i64,
    pub order: Order,
}

impl ArticleQuery {
    pub fn build(filter: &ArticleFilter) -> Self {
        let page = filter.page.unwrap_or(DEFAULT_PAGE).max(1);
        let limit = filter.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

        let mut predicates = Vec::with_capacity(2);
        if let Some(author_id) = filter.author_id {
            predicates.push(Predicate::AuthorEquals(author_id));
        }
        if filter.publish_date_from.is_some() || filter.publish_date_to.is_some() {
            predicates.push(Predicate::CreatedWithin {
                from: filter.publish_date_from,
                to: filter.publish_date_to,
            });
        }

        Self {
            predicates,
            page,
            limit,
            skip: (i64::from(page) - 1) * i64::from(limit),
            take: i64::from(limit),
            order: Order::CreatedDesc,
        }
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        let limit = i64::from(self.limit);
        (total.max(0) + limit - 1) / limit
    }
}
