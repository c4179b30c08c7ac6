use sea_orm::sea_query::Expr;

use crate::{
  entity::{AffiliateStatus, affiliate},
  prelude::*,
};

/// Guarded approve/reject workflow. The `WHERE status = 'Pending'` guard
/// rides in the update itself, so two concurrent calls cannot both win
/// and a late call cannot clobber `approved_at`/`approved_by`.
pub struct Approval<'a> {
  db: &'a DatabaseConnection,
}

/// Result of a guarded transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  Applied,
  /// The record exists but already left `Pending`; nothing was written.
  AlreadyProcessed,
}

impl<'a> Approval<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn approve(&self, id: i32, actor_id: i64) -> Result<Outcome> {
    let now = Utc::now().naive_utc();

    let res = affiliate::Entity::update_many()
      .col_expr(
        affiliate::Column::Status,
        Expr::value(AffiliateStatus::Approved),
      )
      .col_expr(affiliate::Column::ApprovedAt, Expr::value(Some(now)))
      .col_expr(affiliate::Column::ApprovedBy, Expr::value(Some(actor_id)))
      .filter(affiliate::Column::Id.eq(id))
      .filter(affiliate::Column::Status.eq(AffiliateStatus::Pending))
      .exec(self.db)
      .await?;

    if res.rows_affected > 0 {
      info!(id, actor_id, "affiliate approved");
    }
    self.outcome(id, res.rows_affected).await
  }

  pub async fn reject(&self, id: i32) -> Result<Outcome> {
    let res = affiliate::Entity::update_many()
      .col_expr(
        affiliate::Column::Status,
        Expr::value(AffiliateStatus::Rejected),
      )
      .filter(affiliate::Column::Id.eq(id))
      .filter(affiliate::Column::Status.eq(AffiliateStatus::Pending))
      .exec(self.db)
      .await?;

    if res.rows_affected > 0 {
      info!(id, "affiliate rejected");
    }
    self.outcome(id, res.rows_affected).await
  }

  /// The guard matching nothing means either the record is gone or it
  /// already left `Pending`; a follow-up read tells the two apart.
  async fn outcome(&self, id: i32, rows_affected: u64) -> Result<Outcome> {
    if rows_affected > 0 {
      return Ok(Outcome::Applied);
    }

    affiliate::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .map(|_| Outcome::AlreadyProcessed)
      .ok_or(Error::AffiliateNotFound)
  }

  pub async fn pending(&self) -> Result<Vec<affiliate::Model>> {
    Ok(
      affiliate::Entity::find()
        .filter(affiliate::Column::Status.eq(AffiliateStatus::Pending))
        .order_by_desc(affiliate::Column::CreatedAt)
        .order_by_desc(affiliate::Column::Id)
        .all(self.db)
        .await?,
    )
  }
}
