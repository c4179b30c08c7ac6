use crate::{entity::downline, prelude::*};

/// Resolves the upline (sub2) for a prospective downline. Generic over
/// the connection so it runs inside the insert transaction of
/// [`sv::Downline::add_via_code`](crate::sv::Downline::add_via_code).
pub struct Chain<'a, C> {
  conn: &'a C,
}

impl<'a, C: ConnectionTrait> Chain<'a, C> {
  pub fn new(conn: &'a C) -> Self {
    Self { conn }
  }

  /// The chain is not materialized as a tree: the upline of `affiliate_id`
  /// is the `sub2` of the most recently created downline row referencing
  /// it on either side, or `None` when it has no history. Ties on
  /// `created_at` go to the highest id (insertion order). Climbs exactly
  /// one generation, never an ancestor walk.
  pub async fn resolve_upline(&self, affiliate_id: i32) -> Result<Option<i32>> {
    let latest = downline::Entity::find()
      .filter(
        downline::Column::Sub1AffiliateId
          .eq(affiliate_id)
          .or(downline::Column::Sub2AffiliateId.eq(affiliate_id)),
      )
      .order_by_desc(downline::Column::CreatedAt)
      .order_by_desc(downline::Column::Id)
      .one(self.conn)
      .await?;

    Ok(latest.and_then(|row| row.sub2_affiliate_id))
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeDelta;

  use super::*;
  use crate::{
    entity::{AffiliateStatus, affiliate},
    sv::test_utils::test_db,
  };

  async fn seed_affiliate(db: &DatabaseConnection, n: u32) -> i32 {
    affiliate::ActiveModel {
      affiliate_code: Set(Some(format!("VTX0900{n}"))),
      full_name: Set(format!("Affiliate {n}")),
      email: Set(format!("a{n}@example.com")),
      mt5_rebate_account: Set(format!("3000{n}")),
      status: Set(AffiliateStatus::Approved),
      created_at: Set(Utc::now().naive_utc()),
      ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
  }

  async fn insert_row(
    db: &DatabaseConnection,
    email: &str,
    sub1: i32,
    sub2: Option<i32>,
    created_at: DateTime,
  ) -> downline::Model {
    downline::ActiveModel {
      full_name: Set("Recruit".into()),
      email: Set(email.into()),
      sub1_affiliate_id: Set(sub1),
      sub2_affiliate_id: Set(sub2),
      status: Set("Active".into()),
      created_at: Set(created_at),
      ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
  }

  #[tokio::test]
  async fn test_no_history_resolves_to_none() {
    let db = test_db::setup().await;

    let sub2 = Chain::new(&db).resolve_upline(1).await.unwrap();
    assert_eq!(sub2, None);
  }

  #[tokio::test]
  async fn test_rootless_recruiter_stays_rootless() {
    // A recruits twice; neither row gives A an upline.
    let db = test_db::setup().await;
    let a = seed_affiliate(&db, 1).await;
    let now = Utc::now().naive_utc();

    insert_row(&db, "d1@example.com", a, None, now).await;
    assert_eq!(Chain::new(&db).resolve_upline(a).await.unwrap(), None);

    insert_row(&db, "d2@example.com", a, None, now).await;
    assert_eq!(Chain::new(&db).resolve_upline(a).await.unwrap(), None);
  }

  #[tokio::test]
  async fn test_sub2_of_latest_row_propagates() {
    let db = test_db::setup().await;
    let a = seed_affiliate(&db, 1).await;
    let b = seed_affiliate(&db, 2).await;
    let now = Utc::now().naive_utc();

    // A recruited under B: row sub1 = A, sub2 = B.
    insert_row(&db, "d1@example.com", a, Some(b), now).await;

    assert_eq!(Chain::new(&db).resolve_upline(a).await.unwrap(), Some(b));
  }

  #[tokio::test]
  async fn test_appearing_as_sub2_counts_as_history() {
    let db = test_db::setup().await;
    let a = seed_affiliate(&db, 1).await;
    let b = seed_affiliate(&db, 2).await;
    let now = Utc::now().naive_utc();

    // B appears only on the sub2 side; the lookup still matches and
    // propagates that row's sub2 value.
    insert_row(&db, "d1@example.com", a, Some(b), now).await;

    assert_eq!(Chain::new(&db).resolve_upline(b).await.unwrap(), Some(b));
  }

  #[tokio::test]
  async fn test_most_recent_row_wins() {
    let db = test_db::setup().await;
    let a = seed_affiliate(&db, 1).await;
    let old = seed_affiliate(&db, 2).await;
    let new = seed_affiliate(&db, 3).await;
    let now = Utc::now().naive_utc();

    insert_row(&db, "old@example.com", a, Some(old), now - TimeDelta::hours(2))
      .await;
    insert_row(&db, "new@example.com", a, Some(new), now).await;

    assert_eq!(Chain::new(&db).resolve_upline(a).await.unwrap(), Some(new));
  }

  #[tokio::test]
  async fn test_created_at_tie_breaks_by_highest_id() {
    let db = test_db::setup().await;
    let a = seed_affiliate(&db, 1).await;
    let b = seed_affiliate(&db, 2).await;
    let c = seed_affiliate(&db, 3).await;
    let now = Utc::now().naive_utc();

    let first = insert_row(&db, "t1@example.com", a, Some(b), now).await;
    let second = insert_row(&db, "t2@example.com", a, Some(c), now).await;
    assert!(second.id > first.id);

    assert_eq!(Chain::new(&db).resolve_upline(a).await.unwrap(), Some(c));
  }
}
