use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Enable foreign keys for SQLite
        if manager.get_database_backend() == sea_orm::DatabaseBackend::Sqlite {
            manager
                .get_connection()
                .execute_unprepared("PRAGMA foreign_keys = ON")
                .await?;
        }

        // Create venues table
        manager
            .create_table(
                Table::create()
                    .table(Venues::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Venues::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string(Venues::Name))
                    .col(string_null(Venues::City))
                    .col(string_null(Venues::State))
                    .col(string_null(Venues::Address))
                    .col(string_null(Venues::Phone))
                    .col(string_null(Venues::ImageLink))
                    .col(string_null(Venues::FacebookLink))
                    .col(string_null(Venues::Website))
                    .col(string(Venues::Genres))
                    .col(
                        ColumnDef::new(Venues::SeekingTalent)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(text_null(Venues::SeekingDescription))
                    .to_owned(),
            )
            .await?;

        // Create artists table
        manager
            .create_table(
                Table::create()
                    .table(Artists::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Artists::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string(Artists::Name))
                    .col(string_null(Artists::City))
                    .col(string_null(Artists::State))
                    .col(string_null(Artists::Phone))
                    .col(string_null(Artists::ImageLink))
                    .col(string_null(Artists::FacebookLink))
                    .col(string_null(Artists::Website))
                    .col(string(Artists::Genres))
                    .col(
                        ColumnDef::new(Artists::SeekingVenue)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(text_null(Artists::SeekingDescription))
                    .to_owned(),
            )
            .await?;

        // Create shows table; removing a venue or artist removes its shows
        manager
            .create_table(
                Table::create()
                    .table(Shows::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Shows::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(integer(Shows::ArtistId))
                    .col(integer(Shows::VenueId))
                    .col(big_integer(Shows::StartTime))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shows_artist")
                            .from(Shows::Table, Shows::ArtistId)
                            .to(Artists::Table, Artists::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shows_venue")
                            .from(Shows::Table, Shows::VenueId)
                            .to(Venues::Table, Venues::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create index on shows.start_time
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_shows_start_time")
                    .table(Shows::Table)
                    .col(Shows::StartTime)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Shows::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Artists::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Venues::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Venues {
    Table,
    Id,
    Name,
    City,
    State,
    Address,
    Phone,
    ImageLink,
    FacebookLink,
    Website,
    Genres,
    SeekingTalent,
    SeekingDescription,
}

#[derive(DeriveIden)]
enum Artists {
    Table,
    Id,
    Name,
    City,
    State,
    Phone,
    ImageLink,
    FacebookLink,
    Website,
    Genres,
    SeekingVenue,
    SeekingDescription,
}

#[derive(DeriveIden)]
enum Shows {
    Table,
    Id,
    ArtistId,
    VenueId,
    StartTime,
}
