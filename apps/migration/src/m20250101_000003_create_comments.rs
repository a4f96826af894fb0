use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_users::BlogUser;
use super::m20250101_000002_create_posts::BlogPost;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BlogComment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BlogComment::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BlogComment::PostId).integer().not_null())
                    .col(ColumnDef::new(BlogComment::AuthorId).integer().not_null())
                    .col(ColumnDef::new(BlogComment::Content).text().not_null())
                    .col(
                        ColumnDef::new(BlogComment::PublishedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    // Comments are owned by their post.
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_blog_comment_post")
                            .from(BlogComment::Table, BlogComment::PostId)
                            .to(BlogPost::Table, BlogPost::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_blog_comment_author")
                            .from(BlogComment::Table, BlogComment::AuthorId)
                            .to(BlogUser::Table, BlogUser::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_blog_comment_post")
                    .table(BlogComment::Table)
                    .col(BlogComment::PostId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BlogComment::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum BlogComment {
    Table,
    Id,
    PostId,
    AuthorId,
    Content,
    PublishedAt,
}
