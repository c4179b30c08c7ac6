use sea_orm_migration::prelude::*;

use super::m20260815_000001_create_affiliates::Affiliates;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Downlines::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Downlines::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Downlines::FullName).string().not_null())
          .col(ColumnDef::new(Downlines::Email).string().not_null())
          .col(
            ColumnDef::new(Downlines::Sub1AffiliateId).integer().not_null(),
          )
          .col(ColumnDef::new(Downlines::Sub2AffiliateId).integer().null())
          .col(
            ColumnDef::new(Downlines::Status)
              .string()
              .not_null()
              .default("Active"),
          )
          .col(ColumnDef::new(Downlines::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_downlines_sub1")
              .from(Downlines::Table, Downlines::Sub1AffiliateId)
              .to(Affiliates::Table, Affiliates::Id),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_downlines_sub2")
              .from(Downlines::Table, Downlines::Sub2AffiliateId)
              .to(Affiliates::Table, Affiliates::Id),
          )
          .to_owned(),
      )
      .await?;

    // A person may be a downline at most once.
    manager
      .create_index(
        Index::create()
          .name("idx_downlines_email")
          .table(Downlines::Table)
          .col(Downlines::Email)
          .unique()
          .to_owned(),
      )
      .await?;

    // Upline resolution scans by either referrer column.
    manager
      .create_index(
        Index::create()
          .name("idx_downlines_sub1")
          .table(Downlines::Table)
          .col(Downlines::Sub1AffiliateId)
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_downlines_sub2")
          .table(Downlines::Table)
          .col(Downlines::Sub2AffiliateId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Downlines::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum Downlines {
  Table,
  Id,
  FullName,
  Email,
  Sub1AffiliateId,
  Sub2AffiliateId,
  Status,
  CreatedAt,
}
