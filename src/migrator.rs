use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240101_000002_create_hosts_table::Migration),
            Box::new(m20240101_000003_create_amenities_table::Migration),
            Box::new(m20240101_000004_create_properties_table::Migration),
            Box::new(m20240101_000005_create_property_amenities_table::Migration),
            Box::new(m20240101_000006_create_reviews_table::Migration),
            Box::new(m20240101_000007_create_bookings_table::Migration),
        ]
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Password,
    Name,
    Email,
    PhoneNumber,
    ProfilePicture,
    Role,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Hosts {
    Table,
    Id,
    Username,
    Password,
    Name,
    Email,
    PhoneNumber,
    ProfilePicture,
    AboutMe,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Amenities {
    Table,
    Id,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Properties {
    Table,
    Id,
    Title,
    Description,
    Location,
    PricePerNight,
    BedroomCount,
    BathroomCount,
    MaxGuestCount,
    Rating,
    HostId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PropertyAmenities {
    Table,
    PropertyId,
    AmenityId,
}

#[derive(DeriveIden)]
enum Reviews {
    Table,
    Id,
    UserId,
    PropertyId,
    Rating,
    Comment,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Bookings {
    Table,
    Id,
    UserId,
    PropertyId,
    CheckinDate,
    CheckoutDate,
    NumberOfGuests,
    TotalPrice,
    BookingStatus,
    CreatedAt,
    UpdatedAt,
}

mod m20240101_000001_create_users_table {
    use super::Users;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).string().primary_key().not_null())
                        .col(ColumnDef::new(Users::Username).string().not_null().unique_key())
                        .col(ColumnDef::new(Users::Password).string().not_null())
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                        .col(
                            ColumnDef::new(Users::PhoneNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::ProfilePicture).string().null())
                        .col(
                            ColumnDef::new(Users::Role)
                                .string_len(20)
                                .not_null()
                                .default("user"),
                        )
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000002_create_hosts_table {
    use super::Hosts;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_hosts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Hosts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Hosts::Id).string().primary_key().not_null())
                        .col(ColumnDef::new(Hosts::Username).string().not_null().unique_key())
                        .col(ColumnDef::new(Hosts::Password).string().not_null())
                        .col(ColumnDef::new(Hosts::Name).string().not_null())
                        .col(ColumnDef::new(Hosts::Email).string().not_null().unique_key())
                        .col(
                            ColumnDef::new(Hosts::PhoneNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Hosts::ProfilePicture).string().null())
                        .col(ColumnDef::new(Hosts::AboutMe).text().null())
                        .col(
                            ColumnDef::new(Hosts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Hosts::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Hosts::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000003_create_amenities_table {
    use super::Amenities;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_amenities_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Amenities::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Amenities::Id)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Amenities::Name).string().not_null())
                        .col(
                            ColumnDef::new(Amenities::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Amenities::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_amenities_name")
                        .table(Amenities::Table)
                        .col(Amenities::Name)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Amenities::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000004_create_properties_table {
    use super::{Hosts, Properties};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_properties_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Properties::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Properties::Id)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Properties::Title).string().not_null())
                        .col(ColumnDef::new(Properties::Description).text().not_null())
                        .col(ColumnDef::new(Properties::Location).string().not_null())
                        .col(
                            ColumnDef::new(Properties::PricePerNight)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Properties::BedroomCount).integer().not_null())
                        .col(ColumnDef::new(Properties::BathroomCount).integer().not_null())
                        .col(ColumnDef::new(Properties::MaxGuestCount).integer().not_null())
                        .col(ColumnDef::new(Properties::Rating).integer().null())
                        .col(ColumnDef::new(Properties::HostId).string().not_null())
                        .col(
                            ColumnDef::new(Properties::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Properties::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_properties_host_id")
                                .from(Properties::Table, Properties::HostId)
                                .to(Hosts::Table, Hosts::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_properties_host_id")
                        .table(Properties::Table)
                        .col(Properties::HostId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_properties_location")
                        .table(Properties::Table)
                        .col(Properties::Location)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Properties::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000005_create_property_amenities_table {
    use super::{Amenities, Properties, PropertyAmenities};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_property_amenities_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PropertyAmenities::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PropertyAmenities::PropertyId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PropertyAmenities::AmenityId)
                                .string()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(PropertyAmenities::PropertyId)
                                .col(PropertyAmenities::AmenityId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_property_amenities_property_id")
                                .from(PropertyAmenities::Table, PropertyAmenities::PropertyId)
                                .to(Properties::Table, Properties::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_property_amenities_amenity_id")
                                .from(PropertyAmenities::Table, PropertyAmenities::AmenityId)
                                .to(Amenities::Table, Amenities::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PropertyAmenities::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000006_create_reviews_table {
    use super::{Properties, Reviews, Users};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_reviews_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Reviews::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Reviews::Id).string().primary_key().not_null())
                        .col(ColumnDef::new(Reviews::UserId).string().not_null())
                        .col(ColumnDef::new(Reviews::PropertyId).string().not_null())
                        .col(ColumnDef::new(Reviews::Rating).integer().not_null())
                        .col(ColumnDef::new(Reviews::Comment).text().null())
                        .col(
                            ColumnDef::new(Reviews::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Reviews::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_reviews_user_id")
                                .from(Reviews::Table, Reviews::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_reviews_property_id")
                                .from(Reviews::Table, Reviews::PropertyId)
                                .to(Properties::Table, Properties::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_reviews_property_id")
                        .table(Reviews::Table)
                        .col(Reviews::PropertyId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Reviews::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000007_create_bookings_table {
    use super::{Bookings, Properties, Users};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_bookings_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Bookings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Bookings::Id)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Bookings::UserId).string().not_null())
                        .col(ColumnDef::new(Bookings::PropertyId).string().not_null())
                        .col(
                            ColumnDef::new(Bookings::CheckinDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Bookings::CheckoutDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Bookings::NumberOfGuests).integer().not_null())
                        .col(
                            ColumnDef::new(Bookings::TotalPrice)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Bookings::BookingStatus)
                                .string_len(20)
                                .not_null()
                                .default("pending"),
                        )
                        .col(
                            ColumnDef::new(Bookings::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Bookings::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bookings_user_id")
                                .from(Bookings::Table, Bookings::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bookings_property_id")
                                .from(Bookings::Table, Bookings::PropertyId)
                                .to(Properties::Table, Properties::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bookings_user_id")
                        .table(Bookings::Table)
                        .col(Bookings::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bookings_property_id")
                        .table(Bookings::Table)
                        .col(Bookings::PropertyId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Bookings::Table).to_owned())
                .await
        }
    }
}
