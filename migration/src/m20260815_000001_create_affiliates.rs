use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Affiliates::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Affiliates::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          // Null only inside the registration transaction, before the
          // code derived from the allocated id is written back.
          .col(ColumnDef::new(Affiliates::AffiliateCode).string().null())
          .col(ColumnDef::new(Affiliates::FullName).string().not_null())
          .col(ColumnDef::new(Affiliates::Email).string().not_null())
          .col(
            ColumnDef::new(Affiliates::Mt5RebateAccount).string().not_null(),
          )
          .col(ColumnDef::new(Affiliates::ContactDetails).string().null())
          .col(ColumnDef::new(Affiliates::OxIbLink).string().null())
          .col(
            ColumnDef::new(Affiliates::Status)
              .string()
              .not_null()
              .default("Pending"),
          )
          .col(ColumnDef::new(Affiliates::ApprovedAt).date_time().null())
          .col(ColumnDef::new(Affiliates::ApprovedBy).big_integer().null())
          .col(ColumnDef::new(Affiliates::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    // Uniqueness lives in the store: concurrent registrations sharing an
    // email or MT5 account race past any application-level check.
    manager
      .create_index(
        Index::create()
          .name("idx_affiliates_email")
          .table(Affiliates::Table)
          .col(Affiliates::Email)
          .unique()
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_affiliates_mt5_rebate_account")
          .table(Affiliates::Table)
          .col(Affiliates::Mt5RebateAccount)
          .unique()
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_affiliates_code")
          .table(Affiliates::Table)
          .col(Affiliates::AffiliateCode)
          .unique()
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_affiliates_status")
          .table(Affiliates::Table)
          .col(Affiliates::Status)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Affiliates::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum Affiliates {
  Table,
  Id,
  AffiliateCode,
  FullName,
  Email,
  Mt5RebateAccount,
  ContactDetails,
  OxIbLink,
  Status,
  ApprovedAt,
  ApprovedBy,
  CreatedAt,
}
