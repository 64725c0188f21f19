//! A post's life from empty draft to live site, step by step.

mod common;

use chrono::Duration;

use scribe_core::CacheKey;
use scribe_core::domain::{PostChanges, PostStatus};
use scribe_core::ports::Cache;

use common::{TestApp, image};

#[tokio::test]
async fn test_draft_to_live_site() {
    let app = TestApp::new();
    let fixture = app.blog("Field Notes", "site-1").await;
    let owner = fixture.owner_id();

    // 1. A draft needs nothing but its references.
    let draft = app
        .posts
        .create(owner, fixture.blog.id, fixture.bare_draft("lifetimes"), None)
        .await
        .unwrap();
    assert_eq!(draft.status, PostStatus::Draft);

    // 2. Publishing without an image names it among the missing fields.
    let err = app
        .posts
        .update(
            owner,
            draft.id,
            PostChanges {
                status: Some(PostStatus::Published),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "MISSING_FIELDS_FOR_PUBLISH");
    assert!(err.to_string().contains("imageUrl"));

    // Fill in everything the gate asks for.
    let complete = PostChanges {
        title: Some("Understanding lifetimes".to_string()),
        description: Some("Borrowing without tears".to_string()),
        content: Some("Lifetimes name the scope of a borrow.".to_string()),
        tag_ids: Some(vec![fixture.tags[0].id, fixture.tags[1].id]),
        ..Default::default()
    };
    app.posts
        .update(owner, draft.id, complete, Some(image("lifetimes")))
        .await
        .unwrap();

    // 3. A schedule in the past is refused.
    let err = app
        .posts
        .update(
            owner,
            draft.id,
            PostChanges {
                status: Some(PostStatus::Scheduled),
                published_at: Some(app.clock_now() - Duration::hours(1)),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "PUBLISHED_AT_IN_PAST");

    // 4. A day ahead is accepted.
    let publish_at = app.clock_now() + Duration::days(1);
    let scheduled = app
        .posts
        .update(
            owner,
            draft.id,
            PostChanges {
                status: Some(PostStatus::Scheduled),
                published_at: Some(publish_at),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(scheduled.status, PostStatus::Scheduled);
    assert!(app.deploys.triggered_sites().await.is_empty());

    // 5. Once due, the sweeper publishes, evicts the listing cache and deploys once.
    let listing = CacheKey::PostList {
        blog_id: fixture.blog.id,
        category_id: None,
        tag_id: None,
        page: 1,
        page_size: 10,
    }
    .render();
    app.cache.set(&listing, "[]", None).await.unwrap();
    app.clock.set(publish_at + Duration::seconds(30));

    let report = app.sweeper.run_once().await.unwrap();

    assert_eq!(report.published, vec![draft.id]);
    assert!(!app.cache.exists(&listing).await);
    assert_eq!(app.deploys.triggered_sites().await, vec!["site-1".to_string()]);
    let live = app.stored_post(draft.id).await.unwrap();
    assert_eq!(live.status, PostStatus::Published);
    assert_eq!(live.published_at, Some(publish_at));

    // 6. No way back to draft, but plain edits still go through.
    let err = app
        .posts
        .update(
            owner,
            draft.id,
            PostChanges {
                status: Some(PostStatus::Draft),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_STATUS_TRANSITION");

    let edited = app
        .posts
        .update(
            owner,
            draft.id,
            PostChanges {
                title: Some("Understanding lifetimes, part one".to_string()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(edited.title, "Understanding lifetimes, part one");
    assert_eq!(edited.status, PostStatus::Published);
    assert_eq!(app.deploys.triggered_sites().await.len(), 1);
}
