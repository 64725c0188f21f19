use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Blogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Blogs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Blogs::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Blogs::Title).string().not_null())
                    .col(ColumnDef::new(Blogs::DeploySiteId).string())
                    .col(ColumnDef::new(Blogs::DeployToken).string())
                    .col(ColumnDef::new(Blogs::StorageBucket).string())
                    .col(ColumnDef::new(Blogs::StoragePublicDomain).string())
                    .col(ColumnDef::new(Blogs::StorageAccountId).string())
                    .col(ColumnDef::new(Blogs::StorageAccessKeyId).string())
                    .col(ColumnDef::new(Blogs::StorageSecretAccessKey).string())
                    .col(timestamp_now(Blogs::CreatedAt))
                    .col(timestamp_now(Blogs::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BlogMembers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BlogMembers::BlogId).uuid().not_null())
                    .col(ColumnDef::new(BlogMembers::UserId).uuid().not_null())
                    .col(ColumnDef::new(BlogMembers::Role).string().not_null())
                    .col(timestamp_now(BlogMembers::CreatedAt))
                    .primary_key(
                        Index::create()
                            .col(BlogMembers::BlogId)
                            .col(BlogMembers::UserId),
                    )
                    .foreign_key(&mut belongs_to_blog(
                        "fk_blog_members_blog",
                        BlogMembers::Table,
                        BlogMembers::BlogId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Categories::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Categories::BlogId).uuid().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(
                        ColumnDef::new(Categories::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .foreign_key(&mut belongs_to_blog(
                        "fk_categories_blog",
                        Categories::Table,
                        Categories::BlogId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Authors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Authors::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Authors::BlogId).uuid().not_null())
                    .col(ColumnDef::new(Authors::Name).string().not_null())
                    .foreign_key(&mut belongs_to_blog(
                        "fk_authors_blog",
                        Authors::Table,
                        Authors::BlogId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tags::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tags::BlogId).uuid().not_null())
                    .col(ColumnDef::new(Tags::Name).string().not_null())
                    .foreign_key(&mut belongs_to_blog(
                        "fk_tags_blog",
                        Tags::Table,
                        Tags::BlogId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Posts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Posts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Posts::BlogId).uuid().not_null())
                    .col(ColumnDef::new(Posts::Title).string().not_null())
                    .col(ColumnDef::new(Posts::Description).text().not_null().default(""))
                    .col(ColumnDef::new(Posts::Slug).string().not_null())
                    .col(ColumnDef::new(Posts::Content).text().not_null().default(""))
                    .col(ColumnDef::new(Posts::ImageUrl).string())
                    .col(ColumnDef::new(Posts::CategoryId).uuid().not_null())
                    .col(ColumnDef::new(Posts::AuthorId).uuid().not_null())
                    .col(
                        ColumnDef::new(Posts::Status)
                            .string_len(16)
                            .not_null()
                            .default("DRAFT"),
                    )
                    .col(ColumnDef::new(Posts::PublishedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Posts::AiImagePrompt).text())
                    .col(ColumnDef::new(Posts::AiReviewNotes).text())
                    .col(timestamp_now(Posts::CreatedAt))
                    .col(timestamp_now(Posts::UpdatedAt))
                    .foreign_key(&mut belongs_to_blog(
                        "fk_posts_blog",
                        Posts::Table,
                        Posts::BlogId,
                    ))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_posts_category")
                            .from(Posts::Table, Posts::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_posts_author")
                            .from(Posts::Table, Posts::AuthorId)
                            .to(Authors::Table, Authors::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_posts_blog_slug")
                    .table(Posts::Table)
                    .col(Posts::BlogId)
                    .col(Posts::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Sweeper scan: status = 'SCHEDULED' AND published_at <= now
        manager
            .create_index(
                Index::create()
                    .name("idx_posts_status_published_at")
                    .table(Posts::Table)
                    .col(Posts::Status)
                    .col(Posts::PublishedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PostTags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PostTags::PostId).uuid().not_null())
                    .col(ColumnDef::new(PostTags::TagId).uuid().not_null())
                    .col(ColumnDef::new(PostTags::Position).integer().not_null())
                    .primary_key(Index::create().col(PostTags::PostId).col(PostTags::TagId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_tags_post")
                            .from(PostTags::Table, PostTags::PostId)
                            .to(Posts::Table, Posts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_tags_tag")
                            .from(PostTags::Table, PostTags::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PostTags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Posts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Authors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BlogMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Blogs::Table).to_owned())
            .await
    }
}

fn timestamp_now<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

fn belongs_to_blog<T, C>(name: &str, table: T, column: C) -> ForeignKeyCreateStatement
where
    T: IntoIden + 'static,
    C: IntoIden + 'static,
{
    ForeignKey::create()
        .name(name)
        .from(table, column)
        .to(Blogs::Table, Blogs::Id)
        .on_delete(ForeignKeyAction::Cascade)
        .to_owned()
}

#[derive(DeriveIden)]
enum Blogs {
    Table,
    Id,
    OwnerId,
    Title,
    DeploySiteId,
    DeployToken,
    StorageBucket,
    StoragePublicDomain,
    StorageAccountId,
    StorageAccessKeyId,
    StorageSecretAccessKey,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum BlogMembers {
    Table,
    BlogId,
    UserId,
    Role,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    BlogId,
    Name,
    Description,
}

#[derive(DeriveIden)]
enum Authors {
    Table,
    Id,
    BlogId,
    Name,
}

#[derive(DeriveIden)]
enum Tags {
    Table,
    Id,
    BlogId,
    Name,
}

#[derive(DeriveIden)]
enum Posts {
    Table,
    Id,
    BlogId,
    Title,
    Description,
    Slug,
    Content,
    ImageUrl,
    CategoryId,
    AuthorId,
    Status,
    PublishedAt,
    AiImagePrompt,
    AiReviewNotes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PostTags {
    Table,
    PostId,
    TagId,
    Position,
}
