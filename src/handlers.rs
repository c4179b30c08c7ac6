use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::{
  auth::Admin,
  entity::{AffiliateStatus, affiliate, downline},
  prelude::*,
  state::AppState,
  sv,
  sv::approval::Outcome,
};

#[derive(Serialize)]
pub struct Message {
  message: String,
}

fn message(msg: impl Into<String>) -> Json<Message> {
  Json(Message { message: msg.into() })
}

fn default_page() -> u64 {
  1
}

fn default_limit() -> u64 {
  50
}

pub async fn health() -> StatusCode {
  StatusCode::OK
}

// --- public ---

#[derive(Serialize)]
pub struct Registered {
  message: String,
  affiliate_code: String,
}

pub async fn register(
  State(app): State<Arc<AppState>>,
  Json(req): Json<sv::affiliate::Registration>,
) -> Result<(StatusCode, Json<Registered>)> {
  let affiliate = sv::Affiliate::new(&app.db).register(req).await?;

  Ok((
    StatusCode::CREATED,
    Json(Registered {
      message: "Registration successful. Awaiting admin approval.".into(),
      affiliate_code: affiliate.affiliate_code.unwrap_or_default(),
    }),
  ))
}

#[derive(Deserialize)]
pub struct AddDownline {
  pub affiliate_code: String,
  #[serde(flatten)]
  pub recruit: sv::downline::Recruit,
}

pub async fn add_downline(
  State(app): State<Arc<AppState>>,
  Json(req): Json<AddDownline>,
) -> Result<(StatusCode, Json<Message>)> {
  sv::Downline::new(&app.db)
    .add_via_code(&req.affiliate_code, req.recruit)
    .await?;

  Ok((StatusCode::CREATED, message("Downline added successfully")))
}

#[derive(Serialize)]
pub struct DownlineList {
  downlines: Vec<downline::Model>,
}

pub async fn affiliate_downlines(
  State(app): State<Arc<AppState>>,
  Path(code): Path<String>,
) -> Result<Json<DownlineList>> {
  let affiliate = sv::Affiliate::new(&app.db).by_code(&code).await?;
  let downlines =
    sv::Downline::new(&app.db).for_affiliate(affiliate.id).await?;

  Ok(Json(DownlineList { downlines }))
}

// --- admin ---

#[derive(Serialize)]
pub struct AffiliateList {
  affiliates: Vec<affiliate::Model>,
}

pub async fn pending_affiliates(
  Admin(_): Admin,
  State(app): State<Arc<AppState>>,
) -> Result<Json<AffiliateList>> {
  let affiliates = sv::Approval::new(&app.db).pending().await?;
  Ok(Json(AffiliateList { affiliates }))
}

#[derive(Deserialize)]
pub struct AffiliateQuery {
  pub status: Option<AffiliateStatus>,
  #[serde(default = "default_page")]
  pub page: u64,
  #[serde(default = "default_limit")]
  pub limit: u64,
}

#[derive(Serialize)]
pub struct AffiliatePage {
  affiliates: Vec<affiliate::Model>,
  total: u64,
  page: u64,
  total_pages: u64,
}

pub async fn all_affiliates(
  Admin(_): Admin,
  State(app): State<Arc<AppState>>,
  Query(query): Query<AffiliateQuery>,
) -> Result<Json<AffiliatePage>> {
  let page = sv::Affiliate::new(&app.db)
    .list(query.status, query.page, query.limit)
    .await?;

  Ok(Json(AffiliatePage {
    affiliates: page.items,
    total: page.total,
    page: page.page,
    total_pages: page.total_pages,
  }))
}

pub async fn approve_affiliate(
  Admin(actor): Admin,
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Message>> {
  match sv::Approval::new(&app.db).approve(id, actor).await? {
    Outcome::Applied => Ok(message("Affiliate approved successfully")),
    Outcome::AlreadyProcessed => Ok(message("Affiliate already processed")),
  }
}

pub async fn reject_affiliate(
  Admin(_): Admin,
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Message>> {
  match sv::Approval::new(&app.db).reject(id).await? {
    Outcome::Applied => Ok(message("Affiliate rejected successfully")),
    Outcome::AlreadyProcessed => Ok(message("Affiliate already processed")),
  }
}

#[derive(Deserialize)]
pub struct SetStatus {
  pub status: AffiliateStatus,
}

pub async fn update_affiliate_status(
  Admin(actor): Admin,
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
  Json(req): Json<SetStatus>,
) -> Result<Json<Message>> {
  sv::Affiliate::new(&app.db).set_status(id, req.status, actor).await?;
  Ok(message("Affiliate status updated successfully"))
}

#[derive(Deserialize)]
pub struct PageQuery {
  #[serde(default = "default_page")]
  pub page: u64,
  #[serde(default = "default_limit")]
  pub limit: u64,
}

#[derive(Serialize)]
pub struct DownlineRow {
  id: i32,
  full_name: String,
  email: String,
  status: String,
  created_at: DateTime,
  sub1_name: Option<String>,
  sub1_code: Option<String>,
  sub2_name: Option<String>,
  sub2_code: Option<String>,
}

impl From<sv::downline::DownlineDetails> for DownlineRow {
  fn from(details: sv::downline::DownlineDetails) -> Self {
    let row = details.downline;
    Self {
      id: row.id,
      full_name: row.full_name,
      email: row.email,
      status: row.status,
      created_at: row.created_at,
      sub1_name: details.sub1.as_ref().map(|a| a.full_name.clone()),
      sub1_code: details.sub1.and_then(|a| a.affiliate_code),
      sub2_name: details.sub2.as_ref().map(|a| a.full_name.clone()),
      sub2_code: details.sub2.and_then(|a| a.affiliate_code),
    }
  }
}

#[derive(Serialize)]
pub struct DownlinePage {
  downlines: Vec<DownlineRow>,
  total: u64,
  page: u64,
  total_pages: u64,
}

pub async fn all_downlines(
  Admin(_): Admin,
  State(app): State<Arc<AppState>>,
  Query(query): Query<PageQuery>,
) -> Result<Json<DownlinePage>> {
  let page = sv::Downline::new(&app.db).all(query.page, query.limit).await?;

  Ok(Json(DownlinePage {
    downlines: page.items.into_iter().map(Into::into).collect(),
    total: page.total,
    page: page.page,
    total_pages: page.total_pages,
  }))
}

#[derive(Deserialize)]
pub struct AddDownlineManually {
  pub sub1_affiliate_code: String,
  #[serde(default)]
  pub sub2_affiliate_code: Option<String>,
  #[serde(flatten)]
  pub recruit: sv::downline::Recruit,
}

pub async fn add_downline_manually(
  Admin(_): Admin,
  State(app): State<Arc<AppState>>,
  Json(req): Json<AddDownlineManually>,
) -> Result<(StatusCode, Json<Message>)> {
  sv::Downline::new(&app.db)
    .add_manually(
      &req.sub1_affiliate_code,
      req.sub2_affiliate_code.as_deref(),
      req.recruit,
    )
    .await?;

  Ok((StatusCode::CREATED, message("Downline added successfully")))
}
