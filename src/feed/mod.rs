//! Feed domain: identity, the engagement ledger, the content graph and the
//! derived counts that decorate every response.
//!
//! Every operation takes the [`Database`](crate::db::Database) handle
//! explicitly; there is no global state.

pub mod aggregate;
pub mod comments;
pub mod identity;
pub mod ledger;
pub mod posts;

pub use aggregate::{CommentView, PostView};
pub use identity::{AuthSession, NewUser, Viewer};
pub use ledger::{LikeState, Toggle};
pub use posts::{NewPost, PostChanges};

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A requested page of a listing, already clamped to valid bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Build from raw query values. `page` is clamped to at least 1 and
    /// `limit` to `1..=MAX_PAGE_SIZE`; absent values use the defaults.
    #[must_use]
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.unwrap_or(1).clamp(1, i64::from(u32::MAX));
        let limit = limit
            .unwrap_or(i64::from(DEFAULT_PAGE_SIZE))
            .clamp(1, i64::from(MAX_PAGE_SIZE));

        Self {
            page: u32::try_from(page).unwrap_or(1),
            limit: u32::try_from(limit).unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    /// Whether rows exist past this page given `total` matching rows.
    #[must_use]
    pub fn has_more(&self, total: i64) -> bool {
        i64::from(self.page) * i64::from(self.limit) < total
    }
}

/// One page of a listing plus the totals needed to render the envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub has_more: bool,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        Self {
            items,
            page: request.page,
            limit: request.limit,
            total,
            has_more: request.has_more(total),
        }
    }
}
