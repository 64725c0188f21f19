//! Draft seeding and the post-creation worker that consumes its jobs.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use uuid::Uuid;

use scribe_core::domain::{Category, PostStatus};
use scribe_core::ports::{
    BaseRepository, Job, JobResult, PROCESS_POST_CREATION, PostCreationPayload, PostRepository,
};
use scribe_core::retry::RetryPolicy;
use scribe_core::services::{DraftSeeder, PostCreationWorker, SeedPolicy};

use common::{FakeGenerator, RecordingQueue, TestApp};

fn seeder(app: &TestApp, generator: Arc<FakeGenerator>, queue: Arc<RecordingQueue>) -> DraftSeeder {
    DraftSeeder::new(
        app.repos.clone(),
        generator,
        queue,
        app.clock.clone(),
        SeedPolicy {
            title_retry: RetryPolicy::new(3, Duration::ZERO),
            ..Default::default()
        },
    )
}

fn worker(app: &TestApp, generator: Arc<FakeGenerator>) -> PostCreationWorker {
    PostCreationWorker::new(app.repos.clone(), app.posts.clone(), generator)
        .with_retry(RetryPolicy::new(3, Duration::ZERO), RetryPolicy::new(3, Duration::ZERO))
}

#[tokio::test]
async fn test_only_stale_blogs_are_seeded() {
    let app = TestApp::new();
    let empty = app.blog("Empty Blog", "site-empty").await;
    let busy = app.blog("Busy Blog", "site-busy").await;
    let quiet = app.blog("Quiet Blog", "site-quiet").await;

    app.posts
        .create(quiet.owner_id(), quiet.blog.id, quiet.bare_draft("old"), None)
        .await
        .unwrap();
    app.clock.advance(chrono::Duration::days(5));
    app.posts
        .create(busy.owner_id(), busy.blog.id, busy.bare_draft("recent"), None)
        .await
        .unwrap();
    app.clock.advance(chrono::Duration::hours(23));

    let generator = Arc::new(FakeGenerator::default());
    let queue = Arc::new(RecordingQueue::default());
    let report = seeder(&app, generator.clone(), queue.clone())
        .run_once()
        .await
        .unwrap();

    assert_eq!(report.blogs_seeded, 2);
    assert_eq!(report.blogs_skipped, 1);
    assert_eq!(report.jobs_enqueued, 2);
    assert_eq!(generator.title_calls.load(Ordering::SeqCst), 2);

    let jobs = queue.jobs().await;
    let mut seeded: Vec<Uuid> = jobs
        .iter()
        .map(|job| PostCreationPayload::from_job(job).unwrap().blog_id)
        .collect();
    seeded.sort();
    let mut expected = vec![empty.blog.id, quiet.blog.id];
    expected.sort();
    assert_eq!(seeded, expected);
}

#[tokio::test]
async fn test_enqueued_job_payload() {
    let app = TestApp::new();
    let fixture = app.blog("Field Notes", "site-1").await;
    let queue = Arc::new(RecordingQueue::default());

    seeder(&app, Arc::new(FakeGenerator::default()), queue.clone())
        .run_once()
        .await
        .unwrap();

    let jobs = queue.jobs().await;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].job_type, PROCESS_POST_CREATION);
    assert_eq!(jobs[0].max_attempts, 3);
    let payload = PostCreationPayload::from_job(&jobs[0]).unwrap();
    assert_eq!(payload.user_id, fixture.owner_id());
    assert_eq!(payload.blog_id, fixture.blog.id);
    assert_eq!(payload.category_id, fixture.category.id);
    assert_eq!(payload.title, "Fresh ideas in Rust");
    assert_eq!(payload.slug, "fresh-ideas-rust");
}

#[tokio::test]
async fn test_worker_creates_a_tagged_draft() {
    let app = TestApp::new();
    let fixture = app.blog("Field Notes", "site-1").await;
    let generator = Arc::new(FakeGenerator::with_tags(&["ownership", "no-such-tag", "async"]).failing_bodies(2));
    let job = PostCreationPayload {
        user_id: fixture.owner_id(),
        blog_id: fixture.blog.id,
        category_id: fixture.category.id,
        title: "Fresh ideas in Rust".to_string(),
        slug: "fresh-ideas-rust".to_string(),
    }
    .into_job(3)
    .unwrap();

    let result = worker(&app, generator.clone()).handle(job).await;

    assert_eq!(result, JobResult::Success);
    let posts = app.store.find_by_blog(fixture.blog.id).await.unwrap();
    assert_eq!(posts.len(), 1);
    let post = &posts[0];
    assert_eq!(post.status, PostStatus::Draft);
    assert_eq!(post.slug, "fresh-ideas-rust");
    assert_eq!(post.author_id, fixture.author.id);
    assert_eq!(post.tag_ids, vec![fixture.tags[1].id, fixture.tags[0].id]);
    assert!(post.content.starts_with("# Fresh ideas in Rust"));
    assert_eq!(
        post.ai_image_prompt.as_deref(),
        Some("An illustration for: # Fresh ideas in Rust")
    );
}

#[tokio::test]
async fn test_worker_asks_for_retry_when_generation_keeps_failing() {
    let app = TestApp::new();
    let fixture = app.blog("Field Notes", "site-1").await;
    let generator = Arc::new(FakeGenerator::default().failing_bodies(10));
    let job = PostCreationPayload {
        user_id: fixture.owner_id(),
        blog_id: fixture.blog.id,
        category_id: fixture.category.id,
        title: "Doomed".to_string(),
        slug: "doomed".to_string(),
    }
    .into_job(3)
    .unwrap();

    let result = worker(&app, generator).handle(job).await;

    assert!(matches!(result, JobResult::Retry(_)));
    assert!(app.store.find_by_blog(fixture.blog.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_worker_fails_permanently_on_bad_jobs() {
    let app = TestApp::new();
    let fixture = app.blog("Field Notes", "site-1").await;
    let worker = worker(&app, Arc::new(FakeGenerator::default()));

    let unknown = Job::new("send-newsletter", serde_json::json!({}));
    assert!(matches!(worker.handle(unknown).await, JobResult::Failed(_)));

    let garbage = Job::new(PROCESS_POST_CREATION, serde_json::json!({ "title": 7 }));
    assert!(matches!(worker.handle(garbage).await, JobResult::Failed(_)));

    let stray_category = BaseRepository::<Category, Uuid>::save(
        app.store.as_ref(),
        Category::new(Uuid::new_v4(), "Elsewhere", ""),
    )
    .await
    .unwrap();
    let job = PostCreationPayload {
        user_id: fixture.owner_id(),
        blog_id: fixture.blog.id,
        category_id: stray_category.id,
        title: "Wrong blog".to_string(),
        slug: "wrong-blog".to_string(),
    }
    .into_job(3)
    .unwrap();
    assert!(matches!(worker.handle(job).await, JobResult::Failed(_)));
}
