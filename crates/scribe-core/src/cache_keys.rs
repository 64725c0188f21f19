//! Public read-cache key namespace and invalidation.

use std::sync::Arc;

use uuid::Uuid;

use crate::ports::Cache;

const POST_LIST_PREFIX: &str = "public:posts";
const POST_DETAIL_PREFIX: &str = "public:post";

/// A key in the public read cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheKey<'a> {
    /// A page of a blog's published post listing.
    PostList {
        blog_id: Uuid,
        category_id: Option<Uuid>,
        tag_id: Option<Uuid>,
        page: u32,
        page_size: u32,
    },
    /// A single published post.
    PostDetail { blog_id: Uuid, slug: &'a str },
}

impl CacheKey<'_> {
    pub fn render(&self) -> String {
        match self {
            CacheKey::PostList {
                blog_id,
                category_id,
                tag_id,
                page,
                page_size,
            } => format!(
                "{POST_LIST_PREFIX}:{blog_id}:{}:{}:{page}:{page_size}",
                or_all(category_id),
                or_all(tag_id)
            ),
            CacheKey::PostDetail { blog_id, slug } => {
                format!("{POST_DETAIL_PREFIX}:{blog_id}:{slug}")
            }
        }
    }

    /// Glob matching every listing key of a blog.
    pub fn post_list_pattern(blog_id: Uuid) -> String {
        format!("{POST_LIST_PREFIX}:{blog_id}:*")
    }

    /// Glob matching every detail key of a blog.
    pub fn post_detail_pattern(blog_id: Uuid) -> String {
        format!("{POST_DETAIL_PREFIX}:{blog_id}:*")
    }

    /// Every pattern that may hold stale content once a blog's posts change.
    pub fn blog_content_patterns(blog_id: Uuid) -> [String; 2] {
        [
            Self::post_list_pattern(blog_id),
            Self::post_detail_pattern(blog_id),
        ]
    }
}

fn or_all(id: &Option<Uuid>) -> String {
    id.map(|id| id.to_string())
        .unwrap_or_else(|| "all".to_string())
}

/// Evicts cached public content after post mutations.
///
/// Failures are logged and swallowed: the mutation has already been committed
/// and the cache entries expire on their own.
#[derive(Clone)]
pub struct CacheInvalidator {
    cache: Arc<dyn Cache>,
}

impl CacheInvalidator {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }

    /// Drop every listing and detail entry for `blog_id`. Returns how many keys went away.
    pub async fn blog_content_changed(&self, blog_id: Uuid) -> u64 {
        let mut removed = 0;
        for pattern in CacheKey::blog_content_patterns(blog_id) {
            match self.cache.delete_by_pattern(&pattern).await {
                Ok(count) => removed += count,
                Err(err) => {
                    tracing::warn!(%blog_id, pattern = %pattern, error = %err, "Cache invalidation failed");
                }
            }
        }
        tracing::debug!(%blog_id, removed, "Public cache invalidated");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_key_uses_all_for_missing_filters() {
        let blog_id = Uuid::nil();
        let key = CacheKey::PostList {
            blog_id,
            category_id: None,
            tag_id: None,
            page: 1,
            page_size: 10,
        };
        assert_eq!(key.render(), format!("public:posts:{blog_id}:all:all:1:10"));
    }

    #[test]
    fn test_keys_fall_under_their_patterns() {
        let blog_id = Uuid::new_v4();
        let category_id = Uuid::new_v4();
        let list = CacheKey::PostList {
            blog_id,
            category_id: Some(category_id),
            tag_id: None,
            page: 2,
            page_size: 20,
        }
        .render();
        let detail = CacheKey::PostDetail {
            blog_id,
            slug: "hello-world",
        }
        .render();

        let [list_pattern, detail_pattern] = CacheKey::blog_content_patterns(blog_id);
        assert!(list.starts_with(list_pattern.trim_end_matches('*')));
        assert!(detail.starts_with(detail_pattern.trim_end_matches('*')));
        assert_eq!(detail, format!("public:post:{blog_id}:hello-world"));
        assert!(list.contains(&category_id.to_string()));
    }

    #[test]
    fn test_patterns_do_not_overlap() {
        let blog_id = Uuid::new_v4();
        let detail = CacheKey::PostDetail {
            blog_id,
            slug: "x",
        }
        .render();
        assert!(!detail.starts_with(CacheKey::post_list_pattern(blog_id).trim_end_matches('*')));
    }
}
