//! Post lifecycle endpoints.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use scribe_core::domain::{
    DEFAULT_PAGE_SIZE, ImageUpload, NewPost, Post, PostChanges, PostPage, PostQuery, PostStatus,
};
use scribe_shared::ApiResponse;
use scribe_shared::dto::{
    CreatePostRequest, ExportResponse, ImageUploadQuery, ListPostsQuery, MarkdownResponse,
    PostPageResponse, PostResponse, UpdatePostRequest,
};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn parse_status(raw: &str) -> AppResult<PostStatus> {
    raw.parse()
        .map_err(|msg: String| AppError::bad_request("INVALID_STATUS", msg))
}

fn to_response(post: Post) -> PostResponse {
    PostResponse {
        id: post.id,
        blog_id: post.blog_id,
        title: post.title,
        description: post.description,
        slug: post.slug,
        content: post.content,
        image_url: post.image_url,
        category_id: post.category_id,
        author_id: post.author_id,
        tag_ids: post.tag_ids,
        status: post.status.as_str().to_string(),
        published_at: post.published_at,
        ai_image_prompt: post.ai_image_prompt,
        ai_review_notes: post.ai_review_notes,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

fn to_query(raw: ListPostsQuery) -> AppResult<PostQuery> {
    Ok(PostQuery {
        category_id: raw.category_id,
        tag_id: raw.tag_id,
        status: raw.status.as_deref().map(parse_status).transpose()?,
        page: raw.page.unwrap_or(1),
        page_size: raw.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    })
}

fn to_page_response(page: PostPage) -> PostPageResponse {
    PostPageResponse {
        items: page.items.into_iter().map(to_response).collect(),
        total: page.total,
        page: page.page,
        page_size: page.page_size,
        total_pages: page.total_pages,
    }
}

/// GET /api/v1/blogs/{blog_id}/posts
pub async fn list_posts(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    query: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    let query = to_query(query.into_inner())?;
    let page = state
        .posts
        .list_posts(identity.user_id, path.into_inner(), query)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(to_page_response(page))))
}

/// GET /api/v1/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .get_post(identity.user_id, path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(to_response(post))))
}

/// GET /api/public/blogs/{blog_id}/posts
///
/// Published posts only; any status filter is ignored.
pub async fn list_published(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    let query = to_query(query.into_inner())?;
    let page = state.published.list(path.into_inner(), query).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(to_page_response(page))))
}

/// GET /api/public/blogs/{blog_id}/posts/{slug}
pub async fn get_published(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, String)>,
) -> AppResult<HttpResponse> {
    let (blog_id, slug) = path.into_inner();
    let post = state.published.by_slug(blog_id, &slug).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(to_response(post))))
}

/// POST /api/v1/blogs/{blog_id}/posts
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let blog_id = path.into_inner();
    let req = body.into_inner();
    let status = match req.status.as_deref() {
        Some(raw) => parse_status(raw)?,
        None => PostStatus::Draft,
    };

    let input = NewPost {
        title: req.title,
        description: req.description,
        slug: req.slug,
        content: req.content,
        image_url: req.image_url,
        category_id: req.category_id,
        author_id: req.author_id,
        tag_ids: req.tag_ids,
        status,
        published_at: req.published_at,
        ai_image_prompt: req.ai_image_prompt,
    };

    let post = state
        .posts
        .create(identity.user_id, blog_id, input, None)
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(to_response(post))))
}

/// PATCH /api/v1/posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let changes = PostChanges {
        title: req.title,
        description: req.description,
        slug: req.slug,
        content: req.content,
        image_url: req.image_url,
        incoming_image: false,
        category_id: req.category_id,
        author_id: req.author_id,
        tag_ids: req.tag_ids,
        status: req.status.as_deref().map(parse_status).transpose()?,
        published_at: req.published_at,
        ai_image_prompt: req.ai_image_prompt,
        ai_review_notes: req.ai_review_notes,
    };

    let post = state
        .posts
        .update(identity.user_id, path.into_inner(), changes, None)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(to_response(post))))
}

/// PUT /api/v1/posts/{id}/image?name=cover
///
/// The request body is the raw image.
pub async fn upload_image(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    query: web::Query<ImageUploadQuery>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    if body.is_empty() {
        return Err(AppError::bad_request("EMPTY_IMAGE", "Image body is empty"));
    }
    let image = ImageUpload {
        name: query.into_inner().name,
        bytes: body.to_vec(),
    };

    let post = state
        .posts
        .update(
            identity.user_id,
            path.into_inner(),
            PostChanges::default(),
            Some(image),
        )
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(to_response(post))))
}

/// DELETE /api/v1/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .posts
        .delete(identity.user_id, path.into_inner())
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/v1/posts/{id}/markdown
///
/// 204 when the post is not published.
pub async fn get_markdown(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let rendered = state
        .posts
        .to_markdown(identity.user_id, path.into_inner())
        .await?;
    let Some(rendered) = rendered else {
        return Ok(HttpResponse::NoContent().finish());
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(MarkdownResponse {
        folder: rendered.folder,
        file_name: format!("{}.md", rendered.file_stem),
        content: rendered.contents,
    })))
}

/// POST /api/v1/posts/{id}/export
pub async fn export_markdown(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let written = state
        .posts
        .export_markdown(identity.user_id, path.into_inner())
        .await?;
    let Some(written) = written else {
        return Ok(HttpResponse::NoContent().finish());
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(ExportResponse {
        path: written.display().to_string(),
    })))
}
