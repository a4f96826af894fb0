use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BlogUser::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BlogUser::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BlogUser::FullName).string().not_null())
                    .col(ColumnDef::new(BlogUser::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(BlogUser::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(BlogUser::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(BlogUser::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BlogUser::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum BlogUser {
    Table,
    Id,
    FullName,
    Email,
    PasswordHash,
    CreatedAt,
    UpdatedAt,
}
