use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuthRefreshTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuthRefreshTokens::Id)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AuthRefreshTokens::Subject)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuthRefreshTokens::UserId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuthRefreshTokens::ApplicationId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuthRefreshTokens::AuthTime)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AuthRefreshTokens::Amr).json().not_null())
                    .col(ColumnDef::new(AuthRefreshTokens::Audience).json().not_null())
                    .col(ColumnDef::new(AuthRefreshTokens::Scopes).json().not_null())
                    .col(
                        ColumnDef::new(AuthRefreshTokens::Expiration)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_auth_refresh_tokens_user_id")
                    .table(AuthRefreshTokens::Table)
                    .col(AuthRefreshTokens::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_auth_refresh_tokens_expiration")
                    .table(AuthRefreshTokens::Table)
                    .col(AuthRefreshTokens::Expiration)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuthRefreshTokens::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AuthRefreshTokens {
    Table,
    Id,
    Subject,
    UserId,
    ApplicationId,
    AuthTime,
    Amr,
    Audience,
    Scopes,
    Expiration,
}
