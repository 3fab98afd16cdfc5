use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuthTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuthTokens::Id)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AuthTokens::ApplicationId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AuthTokens::Subject).string_len(255).not_null())
                    .col(ColumnDef::new(AuthTokens::RefreshTokenId).string_len(64))
                    .col(ColumnDef::new(AuthTokens::Audience).json().not_null())
                    .col(ColumnDef::new(AuthTokens::Scopes).json().not_null())
                    .col(
                        ColumnDef::new(AuthTokens::Expiration)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 会话终止按 subject 批量删除
        manager
            .create_index(
                Index::create()
                    .name("idx_auth_tokens_subject")
                    .table(AuthTokens::Table)
                    .col(AuthTokens::Subject)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_auth_tokens_expiration")
                    .table(AuthTokens::Table)
                    .col(AuthTokens::Expiration)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuthTokens::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AuthTokens {
    Table,
    Id,
    ApplicationId,
    Subject,
    RefreshTokenId,
    Audience,
    Scopes,
    Expiration,
}
