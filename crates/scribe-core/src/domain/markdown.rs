//! Markdown rendering of published posts for static-site content folders.

use super::blog::Blog;
use super::post::Post;
use super::taxonomy::{Author, Category, Tag};

/// Everything needed to render one post as a markdown document.
#[derive(Debug, Clone)]
pub struct MarkdownDocument<'a> {
    pub blog: &'a Blog,
    pub post: &'a Post,
    pub category: &'a Category,
    pub author: &'a Author,
    pub tags: &'a [Tag],
}

impl MarkdownDocument<'_> {
    /// Front matter followed by the post body.
    pub fn render(&self) -> String {
        let tags = self
            .tags
            .iter()
            .map(|tag| format!("'{}'", quote(&tag.name)))
            .collect::<Vec<_>>()
            .join(", ");
        let pub_date = self
            .post
            .published_at
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        let front_matter = [
            "---".to_string(),
            format!("title: '{}'", quote(&self.post.title)),
            format!("description: '{}'", quote(&self.post.description)),
            format!("pubDate: '{pub_date}'"),
            format!("category: '{}'", quote(&self.category.name)),
            format!("tags: [{tags}]"),
            format!("author: '{}'", quote(&self.author.name)),
            format!("heroImage: '{}'", self.post.image_url.as_deref().unwrap_or("")),
            "draft: false".to_string(),
            "---".to_string(),
            String::new(),
            String::new(),
        ]
        .join("\n");

        front_matter + &self.post.content
    }

    /// Folder the document is written under.
    pub fn folder(&self) -> String {
        self.blog.folder_name()
    }

    /// File name without extension.
    pub fn file_stem(&self) -> &str {
        &self.post.slug
    }
}

/// Single-quoted YAML escaping.
fn quote(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostStatus;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn test_render_front_matter() {
        let blog = Blog::new(Uuid::new_v4(), "Field Notes");
        let category = Category::new(blog.id, "Guides", "How-tos");
        let author = Author::new(blog.id, "Sam");
        let tags = vec![Tag::new(blog.id, "rust"), Tag::new(blog.id, "async")];

        let mut post = Post::new(
            blog.id,
            category.id,
            author.id,
            "It's alive".into(),
            "its-alive".into(),
            Utc::now(),
        );
        post.description = "Don't panic".into();
        post.content = "# Hello".into();
        post.image_url = Some("https://cdn.example.com/hero.webp".into());
        post.status = PostStatus::Published;
        post.published_at = Some(Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap());

        let doc = MarkdownDocument {
            blog: &blog,
            post: &post,
            category: &category,
            author: &author,
            tags: &tags,
        };

        let expected = "---\n\
            title: 'It''s alive'\n\
            description: 'Don''t panic'\n\
            pubDate: '2024-03-09'\n\
            category: 'Guides'\n\
            tags: ['rust', 'async']\n\
            author: 'Sam'\n\
            heroImage: 'https://cdn.example.com/hero.webp'\n\
            draft: false\n\
            ---\n\n# Hello";
        assert_eq!(doc.render(), expected);
        assert_eq!(doc.folder(), "FieldNotes");
        assert_eq!(doc.file_stem(), "its-alive");
    }
}
