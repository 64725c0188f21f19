use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::post::{Post, PostStatus};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Filters and paging for a blog's post listing. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub category_id: Option<Uuid>,
    pub tag_id: Option<Uuid>,
    pub status: Option<PostStatus>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            category_id: None,
            tag_id: None,
            status: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PostQuery {
    pub fn is_valid(&self) -> bool {
        self.page >= 1 && (1..=MAX_PAGE_SIZE).contains(&self.page_size)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    pub fn matches(&self, post: &Post) -> bool {
        self.category_id.is_none_or(|id| post.category_id == id)
            && self.tag_id.is_none_or(|id| post.tag_ids.contains(&id))
            && self.status.is_none_or(|status| post.status == status)
    }
}

/// One page of posts, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostPage {
    pub items: Vec<Post>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

impl PostPage {
    pub fn new(items: Vec<Post>, total: u64, query: &PostQuery) -> Self {
        let page_size = u64::from(query.page_size.max(1));
        Self {
            items,
            total,
            page: query.page,
            page_size: query.page_size,
            total_pages: total.div_ceil(page_size).max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paging_bounds() {
        assert!(PostQuery::default().is_valid());
        let zero_page = PostQuery {
            page: 0,
            ..Default::default()
        };
        assert!(!zero_page.is_valid());
        let oversized = PostQuery {
            page_size: MAX_PAGE_SIZE + 1,
            ..Default::default()
        };
        assert!(!oversized.is_valid());

        let third = PostQuery {
            page: 3,
            page_size: 20,
            ..Default::default()
        };
        assert_eq!(third.offset(), 40);
    }

    #[test]
    fn test_total_pages_is_at_least_one() {
        let query = PostQuery::default();
        assert_eq!(PostPage::new(Vec::new(), 0, &query).total_pages, 1);
        assert_eq!(PostPage::new(Vec::new(), 10, &query).total_pages, 1);
        assert_eq!(PostPage::new(Vec::new(), 11, &query).total_pages, 2);
    }
}
