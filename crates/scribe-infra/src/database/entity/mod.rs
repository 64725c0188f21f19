//! SeaORM entities for the blogging schema.

pub mod author;
pub mod blog;
pub mod blog_member;
pub mod category;
pub mod post;
pub mod post_tag;
pub mod tag;
