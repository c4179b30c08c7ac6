use sea_orm::{ItemsAndPagesNumber, SqlErr};
use serde::Deserialize;

use crate::{
  entity::{AffiliateStatus, affiliate},
  prelude::*,
};

/// Affiliate identity: registration, code assignment and the
/// unconditional status override.
pub struct Affiliate<'a> {
  db: &'a DatabaseConnection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
  pub full_name: String,
  pub email: String,
  pub mt5_rebate_account: String,
  #[serde(default)]
  pub contact_details: Option<String>,
  #[serde(default)]
  pub ox_ib_link: Option<String>,
}

pub struct AffiliatePage {
  pub items: Vec<affiliate::Model>,
  pub total: u64,
  pub page: u64,
  pub total_pages: u64,
}

impl<'a> Affiliate<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// The human-facing code is a pure function of the allocated id.
  pub fn code_for(id: i32) -> String {
    format!("VTX{id:05}")
  }

  pub async fn register(&self, reg: Registration) -> Result<affiliate::Model> {
    for (field, value) in [
      ("full_name", &reg.full_name),
      ("email", &reg.email),
      ("mt5_rebate_account", &reg.mt5_rebate_account),
    ] {
      if value.trim().is_empty() {
        return Err(Error::InvalidArgs(format!("{field} is required")));
      }
    }

    let txn = self.db.begin().await?;

    let exists = affiliate::Entity::find()
      .filter(
        affiliate::Column::Email
          .eq(&reg.email)
          .or(affiliate::Column::Mt5RebateAccount.eq(&reg.mt5_rebate_account)),
      )
      .one(&txn)
      .await?;

    if exists.is_some() {
      return Err(Error::DuplicateAffiliate);
    }

    let now = Utc::now().naive_utc();
    let inserted = affiliate::ActiveModel {
      full_name: Set(reg.full_name),
      email: Set(reg.email),
      mt5_rebate_account: Set(reg.mt5_rebate_account),
      contact_details: Set(reg.contact_details),
      ox_ib_link: Set(reg.ox_ib_link),
      status: Set(AffiliateStatus::Pending),
      created_at: Set(now),
      ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(duplicate)?;

    // The code depends on the allocated id, so it is written in the same
    // transaction as the insert; no reader observes the row without it.
    let affiliate = affiliate::ActiveModel {
      affiliate_code: Set(Some(Self::code_for(inserted.id))),
      ..inserted.into()
    }
    .update(&txn)
    .await?;

    txn.commit().await?;

    info!(
      id = affiliate.id,
      code = affiliate.affiliate_code.as_deref(),
      "registered affiliate"
    );
    Ok(affiliate)
  }

  pub async fn by_code(&self, code: &str) -> Result<affiliate::Model> {
    affiliate::Entity::find()
      .filter(affiliate::Column::AffiliateCode.eq(code))
      .one(self.db)
      .await?
      .ok_or(Error::AffiliateNotFound)
  }

  pub async fn by_id(&self, id: i32) -> Result<Option<affiliate::Model>> {
    let affiliate = affiliate::Entity::find_by_id(id).one(self.db).await?;
    Ok(affiliate)
  }

  /// Administrative override: writes the status regardless of the current
  /// state. Suspension and bans must stay reachable from anywhere, so
  /// this path deliberately skips transition checks.
  pub async fn set_status(
    &self,
    id: i32,
    status: AffiliateStatus,
    actor_id: i64,
  ) -> Result<()> {
    let affiliate = affiliate::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::AffiliateNotFound)?;

    affiliate::ActiveModel { status: Set(status), ..affiliate.into() }
      .update(self.db)
      .await?;

    info!(id, ?status, actor_id, "affiliate status overridden");
    Ok(())
  }

  pub async fn list(
    &self,
    status: Option<AffiliateStatus>,
    page: u64,
    limit: u64,
  ) -> Result<AffiliatePage> {
    let page = page.max(1);
    let limit = limit.clamp(1, 200);

    let mut query = affiliate::Entity::find()
      .order_by_desc(affiliate::Column::CreatedAt)
      .order_by_desc(affiliate::Column::Id);

    if let Some(status) = status {
      query = query.filter(affiliate::Column::Status.eq(status));
    }

    let paginator = query.paginate(self.db, limit);
    let ItemsAndPagesNumber { number_of_items, number_of_pages } =
      paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(page - 1).await?;

    Ok(AffiliatePage {
      items,
      total: number_of_items,
      page,
      total_pages: number_of_pages,
    })
  }
}

fn duplicate(err: sea_orm::DbErr) -> Error {
  match err.sql_err() {
    Some(SqlErr::UniqueConstraintViolation(_)) => Error::DuplicateAffiliate,
    _ => err.into(),
  }
}
