use sea_orm::{ItemsAndPagesNumber, SqlErr};
use serde::Deserialize;

use crate::{
  entity::{AffiliateStatus, affiliate, downline},
  prelude::*,
  sv,
};

/// Downline identity and its two referrer links.
pub struct Downline<'a> {
  db: &'a DatabaseConnection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Recruit {
  pub full_name: String,
  pub email: String,
}

/// A downline row with its referrers resolved for display.
pub struct DownlineDetails {
  pub downline: downline::Model,
  pub sub1: Option<affiliate::Model>,
  pub sub2: Option<affiliate::Model>,
}

pub struct DownlinePage {
  pub items: Vec<DownlineDetails>,
  pub total: u64,
  pub page: u64,
  pub total_pages: u64,
}

pub const DEFAULT_STATUS: &str = "Active";

impl<'a> Downline<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Public recruiting path: sub2 comes from the chain resolver.
  pub async fn add_via_code(
    &self,
    affiliate_code: &str,
    recruit: Recruit,
  ) -> Result<downline::Model> {
    validate(&recruit)?;

    // Resolution and insert share one transaction: "most recent downline"
    // must not move between the upline lookup and our own insert.
    let txn = self.db.begin().await?;

    let sub1 = approved_by_code(&txn, affiliate_code).await?;
    ensure_email_free(&txn, &recruit.email).await?;

    let sub2 = sv::Chain::new(&txn).resolve_upline(sub1.id).await?;
    let row = insert(&txn, recruit, sub1.id, sub2).await?;

    txn.commit().await?;

    info!(id = row.id, sub1 = sub1.id, sub2, "added downline");
    Ok(row)
  }

  /// Administrative path: the upline is named outright and history is
  /// not consulted. Kept separate from [`Self::add_via_code`] on purpose;
  /// the two paths assign sub2 by different means.
  pub async fn add_manually(
    &self,
    sub1_code: &str,
    sub2_code: Option<&str>,
    recruit: Recruit,
  ) -> Result<downline::Model> {
    validate(&recruit)?;

    let txn = self.db.begin().await?;

    let sub1 = approved_by_code(&txn, sub1_code).await?;
    let sub2 = match sub2_code {
      Some(code) => Some(approved_by_code(&txn, code).await?.id),
      None => None,
    };
    ensure_email_free(&txn, &recruit.email).await?;

    let row = insert(&txn, recruit, sub1.id, sub2).await?;

    txn.commit().await?;

    info!(id = row.id, sub1 = sub1.id, sub2, "added downline manually");
    Ok(row)
  }

  /// Everything the affiliate touches, on either side of the chain,
  /// newest first.
  pub async fn for_affiliate(
    &self,
    affiliate_id: i32,
  ) -> Result<Vec<downline::Model>> {
    Ok(
      downline::Entity::find()
        .filter(
          downline::Column::Sub1AffiliateId
            .eq(affiliate_id)
            .or(downline::Column::Sub2AffiliateId.eq(affiliate_id)),
        )
        .order_by_desc(downline::Column::CreatedAt)
        .order_by_desc(downline::Column::Id)
        .all(self.db)
        .await?,
    )
  }

  pub async fn all(&self, page: u64, limit: u64) -> Result<DownlinePage> {
    let page = page.max(1);
    let limit = limit.clamp(1, 200);

    let paginator = downline::Entity::find()
      .order_by_desc(downline::Column::CreatedAt)
      .order_by_desc(downline::Column::Id)
      .paginate(self.db, limit);
    let ItemsAndPagesNumber { number_of_items, number_of_pages } =
      paginator.num_items_and_pages().await?;
    let rows = paginator.fetch_page(page - 1).await?;

    // One lookup for the whole page instead of a query per referrer.
    let ids: HashSet<i32> = rows
      .iter()
      .flat_map(|row| [Some(row.sub1_affiliate_id), row.sub2_affiliate_id])
      .flatten()
      .collect();
    let referrers: HashMap<i32, affiliate::Model> = affiliate::Entity::find()
      .filter(affiliate::Column::Id.is_in(ids))
      .all(self.db)
      .await?
      .into_iter()
      .map(|model| (model.id, model))
      .collect();

    let items = rows
      .into_iter()
      .map(|row| {
        let sub1 = referrers.get(&row.sub1_affiliate_id).cloned();
        let sub2 =
          row.sub2_affiliate_id.and_then(|id| referrers.get(&id).cloned());
        DownlineDetails { downline: row, sub1, sub2 }
      })
      .collect();

    Ok(DownlinePage {
      items,
      total: number_of_items,
      page,
      total_pages: number_of_pages,
    })
  }
}

fn validate(recruit: &Recruit) -> Result<()> {
  if recruit.full_name.trim().is_empty() {
    return Err(Error::InvalidArgs("full_name is required".into()));
  }
  if recruit.email.trim().is_empty() {
    return Err(Error::InvalidArgs("email is required".into()));
  }
  Ok(())
}

async fn approved_by_code<C: ConnectionTrait>(
  conn: &C,
  code: &str,
) -> Result<affiliate::Model> {
  affiliate::Entity::find()
    .filter(affiliate::Column::AffiliateCode.eq(code))
    .filter(affiliate::Column::Status.eq(AffiliateStatus::Approved))
    .one(conn)
    .await?
    .ok_or(Error::InvalidReferrer)
}

async fn ensure_email_free<C: ConnectionTrait>(
  conn: &C,
  email: &str,
) -> Result<()> {
  let exists = downline::Entity::find()
    .filter(downline::Column::Email.eq(email))
    .one(conn)
    .await?;

  if exists.is_some() { Err(Error::DuplicateDownline) } else { Ok(()) }
}

async fn insert<C: ConnectionTrait>(
  conn: &C,
  recruit: Recruit,
  sub1: i32,
  sub2: Option<i32>,
) -> Result<downline::Model> {
  let now = Utc::now().naive_utc();

  downline::ActiveModel {
    full_name: Set(recruit.full_name),
    email: Set(recruit.email),
    sub1_affiliate_id: Set(sub1),
    sub2_affiliate_id: Set(sub2),
    status: Set(DEFAULT_STATUS.into()),
    created_at: Set(now),
    ..Default::default()
  }
  .insert(conn)
  .await
  .map_err(|err| match err.sql_err() {
    Some(SqlErr::UniqueConstraintViolation(_)) => Error::DuplicateDownline,
    _ => err.into(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::{self, affiliate::Registration, test_utils::test_db};

  async fn approved(db: &DatabaseConnection, n: u32) -> affiliate::Model {
    let affiliate = sv::Affiliate::new(db)
      .register(Registration {
        full_name: format!("Affiliate {n}"),
        email: format!("a{n}@example.com"),
        mt5_rebate_account: format!("4000{n}"),
        contact_details: None,
        ox_ib_link: None,
      })
      .await
      .unwrap();

    sv::Approval::new(db).approve(affiliate.id, 1).await.unwrap();
    sv::Affiliate::new(db).by_id(affiliate.id).await.unwrap().unwrap()
  }

  fn recruit(n: u32) -> Recruit {
    Recruit {
      full_name: format!("Recruit {n}"),
      email: format!("r{n}@example.com"),
    }
  }

  fn code(affiliate: &affiliate::Model) -> &str {
    affiliate.affiliate_code.as_deref().unwrap()
  }

  #[tokio::test]
  async fn test_add_via_code_links_recruiter() {
    let db = test_db::setup().await;
    let a = approved(&db, 1).await;
    let sv = Downline::new(&db);

    let d1 = sv.add_via_code(code(&a), recruit(1)).await.unwrap();
    assert_eq!(d1.sub1_affiliate_id, a.id);
    assert_eq!(d1.sub2_affiliate_id, None);
    assert_eq!(d1.status, DEFAULT_STATUS);

    // A still has no upline; the second recruit stays rootless too.
    let d2 = sv.add_via_code(code(&a), recruit(2)).await.unwrap();
    assert_eq!(d2.sub1_affiliate_id, a.id);
    assert_eq!(d2.sub2_affiliate_id, None);
  }

  #[tokio::test]
  async fn test_add_via_code_propagates_manual_upline() {
    let db = test_db::setup().await;
    let a = approved(&db, 1).await;
    let b = approved(&db, 2).await;
    let sv = Downline::new(&db);

    sv.add_via_code(code(&a), recruit(1)).await.unwrap();

    // An administrator records that A sits under B.
    sv.add_manually(code(&a), Some(code(&b)), recruit(2)).await.unwrap();

    // The manual row is now A's most recent history; its sub2 propagates.
    let d3 = sv.add_via_code(code(&a), recruit(3)).await.unwrap();
    assert_eq!(d3.sub1_affiliate_id, a.id);
    assert_eq!(d3.sub2_affiliate_id, Some(b.id));
  }

  #[tokio::test]
  async fn test_add_via_code_rejects_unapproved_referrers() {
    let db = test_db::setup().await;
    let a = approved(&db, 1).await;

    for status in [
      AffiliateStatus::Pending,
      AffiliateStatus::Rejected,
      AffiliateStatus::Suspended,
      AffiliateStatus::Banned,
    ] {
      sv::Affiliate::new(&db).set_status(a.id, status, 1).await.unwrap();

      assert!(matches!(
        Downline::new(&db).add_via_code(code(&a), recruit(1)).await,
        Err(Error::InvalidReferrer)
      ));
    }
  }

  #[tokio::test]
  async fn test_add_via_code_rejects_unknown_code() {
    let db = test_db::setup().await;

    assert!(matches!(
      Downline::new(&db).add_via_code("VTX99999", recruit(1)).await,
      Err(Error::InvalidReferrer)
    ));
  }

  #[tokio::test]
  async fn test_add_via_code_rejects_duplicate_email() {
    let db = test_db::setup().await;
    let a = approved(&db, 1).await;
    let sv = Downline::new(&db);

    sv.add_via_code(code(&a), recruit(1)).await.unwrap();

    assert!(matches!(
      sv.add_via_code(code(&a), recruit(1)).await,
      Err(Error::DuplicateDownline)
    ));
  }

  #[tokio::test]
  async fn test_add_manually_bypasses_resolver() {
    let db = test_db::setup().await;
    let a = approved(&db, 1).await;
    let b = approved(&db, 2).await;
    let sv = Downline::new(&db);

    // Give A chain history that would resolve to B.
    sv.add_manually(code(&a), Some(code(&b)), recruit(1)).await.unwrap();

    // The manual path takes what the administrator says, history or not.
    let row = sv.add_manually(code(&a), None, recruit(2)).await.unwrap();
    assert_eq!(row.sub2_affiliate_id, None);
  }

  #[tokio::test]
  async fn test_add_manually_rejects_unapproved_sub2() {
    let db = test_db::setup().await;
    let a = approved(&db, 1).await;
    let b = approved(&db, 2).await;

    sv::Affiliate::new(&db)
      .set_status(b.id, AffiliateStatus::Suspended, 1)
      .await
      .unwrap();

    assert!(matches!(
      Downline::new(&db)
        .add_manually(code(&a), Some(code(&b)), recruit(1))
        .await,
      Err(Error::InvalidReferrer)
    ));
  }

  #[tokio::test]
  async fn test_for_affiliate_covers_both_sides_newest_first() {
    let db = test_db::setup().await;
    let a = approved(&db, 1).await;
    let b = approved(&db, 2).await;
    let sv = Downline::new(&db);

    // B appears as sub2 of the first row and sub1 of the second.
    let first =
      sv.add_manually(code(&a), Some(code(&b)), recruit(1)).await.unwrap();
    let second = sv.add_via_code(code(&b), recruit(2)).await.unwrap();

    let rows = sv.for_affiliate(b.id).await.unwrap();
    assert_eq!(
      rows.iter().map(|row| row.id).collect::<Vec<_>>(),
      vec![second.id, first.id]
    );

    // A only touches the first row.
    let rows = sv.for_affiliate(a.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, first.id);
  }

  #[tokio::test]
  async fn test_all_resolves_referrer_display_fields() {
    let db = test_db::setup().await;
    let a = approved(&db, 1).await;
    let b = approved(&db, 2).await;
    let sv = Downline::new(&db);

    sv.add_manually(code(&a), Some(code(&b)), recruit(1)).await.unwrap();
    sv.add_via_code(code(&a), recruit(2)).await.unwrap();
    sv.add_via_code(code(&a), recruit(3)).await.unwrap();

    let page = sv.all(1, 2).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items.len(), 2);

    let page = sv.all(2, 2).await.unwrap();
    assert_eq!(page.items.len(), 1);
    let details = &page.items[0];
    assert_eq!(details.sub1.as_ref().map(|m| m.id), Some(a.id));
    assert_eq!(details.sub2.as_ref().map(|m| m.id), Some(b.id));
  }
}
