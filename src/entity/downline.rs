use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::affiliate;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "downlines")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub full_name: String,
  #[sea_orm(unique)]
  pub email: String,
  /// Direct recruiter.
  pub sub1_affiliate_id: i32,
  /// The recruiter's own upline, one level up. Resolver-computed on the
  /// public path, admin-supplied on the manual path.
  pub sub2_affiliate_id: Option<i32>,
  pub status: String,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "affiliate::Entity",
    from = "Column::Sub1AffiliateId",
    to = "affiliate::Column::Id"
  )]
  Sub1Affiliate,
  #[sea_orm(
    belongs_to = "affiliate::Entity",
    from = "Column::Sub2AffiliateId",
    to = "affiliate::Column::Id"
  )]
  Sub2Affiliate,
}

impl ActiveModelBehavior for ActiveModel {}
