use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};
use uuid::Uuid;

use scribe_core::domain::{Blog, PostQuery, PostStatus};
use scribe_core::ports::{BaseRepository, BlogRepository, PostRepository};

use crate::database::entity::{blog, post, post_tag};
use crate::database::postgres_repo::{PostgresBlogRepository, PostgresPostRepository};

fn post_model(blog_id: Uuid, status: PostStatus) -> post::Model {
    let now = Utc::now();
    post::Model {
        id: Uuid::new_v4(),
        blog_id,
        title: "Lifetimes explained".to_owned(),
        description: "A short tour".to_owned(),
        slug: "lifetimes-explained".to_owned(),
        content: "Body".to_owned(),
        image_url: Some("https://cdn.example.com/blog/images/cover.webp".to_owned()),
        category_id: Uuid::new_v4(),
        author_id: Uuid::new_v4(),
        status: status.as_str().to_owned(),
        published_at: Some((now - Duration::minutes(1)).into()),
        ai_image_prompt: None,
        ai_review_notes: None,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

/// The statements a mock connection saw. Every repository holding it must be dropped first.
fn logged_sql(db: Arc<DatabaseConnection>) -> String {
    let db = Arc::try_unwrap(db)
        .ok()
        .expect("connection still shared with a repository");
    format!("{:?}", db.into_transaction_log())
}

#[tokio::test]
async fn test_find_post_by_id_attaches_tags_in_order() {
    let model = post_model(Uuid::new_v4(), PostStatus::Draft);
    let (first_tag, second_tag) = (Uuid::new_v4(), Uuid::new_v4());

    let db: Arc<DatabaseConnection> = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model.clone()]])
        .append_query_results([vec![
            post_tag::Model {
                post_id: model.id,
                tag_id: first_tag,
                position: 0,
            },
            post_tag::Model {
                post_id: model.id,
                tag_id: second_tag,
                position: 1,
            },
        ]])
        .into_connection()
        .into();

    let repo = PostgresPostRepository::new(db);

    let post = repo.find_by_id(model.id).await.unwrap().unwrap();

    assert_eq!(post.id, model.id);
    assert_eq!(post.status, PostStatus::Draft);
    assert_eq!(post.tag_ids, vec![first_tag, second_tag]);
}

#[tokio::test]
async fn test_unknown_status_is_a_query_error() {
    let mut model = post_model(Uuid::new_v4(), PostStatus::Draft);
    model.status = "ARCHIVED".to_owned();

    let db: Arc<DatabaseConnection> = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model.clone()]])
        .append_query_results([Vec::<post_tag::Model>::new()])
        .into_connection()
        .into();

    let repo = PostgresPostRepository::new(db);

    assert!(repo.find_by_id(model.id).await.is_err());
}

#[tokio::test]
async fn test_find_due_scheduled_filters_on_status() {
    let model = post_model(Uuid::new_v4(), PostStatus::Scheduled);

    let db: Arc<DatabaseConnection> = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model.clone()]])
        .append_query_results([Vec::<post_tag::Model>::new()])
        .into_connection()
        .into();

    let repo = PostgresPostRepository::new(db.clone());
    let due = repo.find_due_scheduled(Utc::now()).await.unwrap();

    assert_eq!(due.len(), 1);
    assert_eq!(due[0].status, PostStatus::Scheduled);
    drop(repo);
    let sql = logged_sql(db);
    assert!(sql.contains("published_at"));
    assert!(sql.contains("SCHEDULED"));
}

#[tokio::test]
async fn test_publish_scheduled_returns_flipped_ids() {
    let blog_id = Uuid::new_v4();
    let mut flipped = post_model(blog_id, PostStatus::Published);
    flipped.updated_at = Utc::now().into();
    let skipped = Uuid::new_v4();

    let db: Arc<DatabaseConnection> = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![flipped.clone()]])
        .into_connection()
        .into();

    let repo = PostgresPostRepository::new(db.clone());
    let ids = repo
        .publish_scheduled(&[flipped.id, skipped], Utc::now())
        .await
        .unwrap();

    assert_eq!(ids, vec![flipped.id]);
    drop(repo);
    let sql = logged_sql(db);
    assert!(sql.contains("UPDATE"));
    assert!(sql.contains("RETURNING"));
    let (Some(where_at), Some(returning_at)) = (sql.find("WHERE"), sql.find("RETURNING")) else {
        panic!("unexpected statement: {sql}");
    };
    let filter = &sql[where_at..returning_at];
    assert!(filter.contains("SCHEDULED"));
    assert!(filter.contains("published_at"));
}

#[tokio::test]
async fn test_find_page_counts_then_pages_with_tag_filter() {
    let model = post_model(Uuid::new_v4(), PostStatus::Published);
    let tag_id = Uuid::new_v4();

    let db: Arc<DatabaseConnection> = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![BTreeMap::from([(
            "num_items",
            Value::BigInt(Some(11)),
        )])]])
        .append_query_results([vec![model.clone()]])
        .append_query_results([vec![post_tag::Model {
            post_id: model.id,
            tag_id,
            position: 0,
        }]])
        .into_connection()
        .into();

    let repo = PostgresPostRepository::new(db.clone());
    let query = PostQuery {
        tag_id: Some(tag_id),
        status: Some(PostStatus::Published),
        page: 2,
        page_size: 10,
        ..Default::default()
    };
    let page = repo.find_page(model.blog_id, &query).await.unwrap();

    assert_eq!(page.total, 11);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items[0].tag_ids, vec![tag_id]);
    drop(repo);
    let sql = logged_sql(db);
    assert!(sql.contains("post_tags"));
    assert!(sql.contains("LIMIT"));
    assert!(sql.contains("OFFSET"));
}

#[tokio::test]
async fn test_publish_scheduled_with_no_ids_skips_the_database() {
    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
    let repo = PostgresPostRepository::new(db);

    assert!(repo.publish_scheduled(&[], Utc::now()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_latest_created_at() {
    let model = post_model(Uuid::new_v4(), PostStatus::Draft);

    let db: Arc<DatabaseConnection> = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model.clone()]])
        .into_connection()
        .into();

    let repo = PostgresPostRepository::new(db);
    let latest = repo.latest_created_at(model.blog_id).await.unwrap();

    let expected: DateTime<Utc> = model.created_at.into();
    assert_eq!(latest, Some(expected));
}

#[tokio::test]
async fn test_save_inserts_when_row_is_missing() {
    let blog = Blog::new(Uuid::new_v4(), "Field Notes");
    let model = blog::Model {
        id: blog.id,
        owner_id: blog.owner_id,
        title: blog.title.clone(),
        deploy_site_id: None,
        deploy_token: None,
        storage_bucket: None,
        storage_public_domain: None,
        storage_account_id: None,
        storage_access_key_id: None,
        storage_secret_access_key: None,
        created_at: blog.created_at.into(),
        updated_at: blog.updated_at.into(),
    };

    // UPDATE ... RETURNING finds nothing, then INSERT ... RETURNING yields the row.
    let db: Arc<DatabaseConnection> = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<blog::Model>::new()])
        .append_query_results([vec![model]])
        .into_connection()
        .into();

    let repo = PostgresBlogRepository::new(db);
    let saved: Blog = repo.save(blog.clone()).await.unwrap();

    assert_eq!(saved.id, blog.id);
    assert!(saved.deploy.is_none());
}

#[tokio::test]
async fn test_find_all_blogs_maps_deploy_target() {
    let now = Utc::now();
    let model = blog::Model {
        id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        title: "Field Notes".to_owned(),
        deploy_site_id: Some("site-1".to_owned()),
        deploy_token: Some("token".to_owned()),
        storage_bucket: Some("bucket".to_owned()),
        storage_public_domain: Some("https://cdn.example.com".to_owned()),
        storage_account_id: None,
        storage_access_key_id: None,
        storage_secret_access_key: None,
        created_at: now.into(),
        updated_at: now.into(),
    };

    let db: Arc<DatabaseConnection> = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model]])
        .into_connection()
        .into();

    let repo = PostgresBlogRepository::new(db);
    let blogs = repo.find_all().await.unwrap();

    assert_eq!(blogs.len(), 1);
    assert_eq!(blogs[0].deploy_target().unwrap().site_id, "site-1");
    assert_eq!(
        blogs[0].storage.as_ref().unwrap().public_domain,
        "https://cdn.example.com"
    );
}

#[tokio::test]
async fn test_delete_missing_post_is_not_found() {
    let db: Arc<DatabaseConnection> = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection()
        .into();

    let repo = PostgresPostRepository::new(db);

    assert!(matches!(
        repo.delete(Uuid::new_v4()).await,
        Err(scribe_core::error::RepoError::NotFound)
    ));
}
