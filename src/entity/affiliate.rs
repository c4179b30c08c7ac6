use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of an affiliate record. `Pending` at registration;
/// the guarded workflow moves it to `Approved`/`Rejected`, the admin
/// override can set anything from anywhere.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum AffiliateStatus {
  #[sea_orm(string_value = "Pending")]
  #[default]
  Pending,
  #[sea_orm(string_value = "Approved")]
  Approved,
  #[sea_orm(string_value = "Rejected")]
  Rejected,
  #[sea_orm(string_value = "Suspended")]
  Suspended,
  #[sea_orm(string_value = "Banned")]
  Banned,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "affiliates")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  /// Derived from `id` (`VTX` + zero-padded to 5 digits) inside the
  /// registration transaction; never user-supplied.
  #[sea_orm(unique)]
  pub affiliate_code: Option<String>,
  pub full_name: String,
  #[sea_orm(unique)]
  pub email: String,
  #[sea_orm(unique)]
  pub mt5_rebate_account: String,
  pub contact_details: Option<String>,
  pub ox_ib_link: Option<String>,
  pub status: AffiliateStatus,
  pub approved_at: Option<DateTime>,
  pub approved_by: Option<i64>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
