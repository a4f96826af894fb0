use sea_orm_migration::prelude::*;

use super::m20250101_000002_create_posts::BlogPost;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BlogTag::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BlogTag::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BlogTag::Name).string().not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BlogPostTag::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BlogPostTag::PostId).integer().not_null())
                    .col(ColumnDef::new(BlogPostTag::TagId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(BlogPostTag::PostId)
                            .col(BlogPostTag::TagId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_blog_post_tag_post")
                            .from(BlogPostTag::Table, BlogPostTag::PostId)
                            .to(BlogPost::Table, BlogPost::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_blog_post_tag_tag")
                            .from(BlogPostTag::Table, BlogPostTag::TagId)
                            .to(BlogTag::Table, BlogTag::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BlogPostTag::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BlogTag::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum BlogTag {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum BlogPostTag {
    Table,
    PostId,
    TagId,
}
