use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Watchlist::Table)
                    .if_not_exists()
                    .col(integer(Watchlist::Id).primary_key())
                    .col(string(Watchlist::Title))
                    .col(text_null(Watchlist::Overview))
                    .col(string_null(Watchlist::PosterPath))
                    .col(double(Watchlist::VoteAverage))
                    .col(string_null(Watchlist::ReleaseDate))
                    .col(big_integer(Watchlist::AddedDate))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_watchlist_added_date")
                    .table(Watchlist::Table)
                    .col(Watchlist::AddedDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Watchlist::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Watchlist {
    Table,
    Id,
    Title,
    Overview,
    #[sea_orm(iden = "posterPath")]
    PosterPath,
    #[sea_orm(iden = "voteAverage")]
    VoteAverage,
    #[sea_orm(iden = "releaseDate")]
    ReleaseDate,
    #[sea_orm(iden = "addedDate")]
    AddedDate,
}
