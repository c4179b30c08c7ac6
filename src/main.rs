mod auth;
mod entity;
mod error;
mod handlers;
mod prelude;
mod state;
mod sv;

use std::{collections::HashSet, env, net::SocketAddr, sync::Arc};

use axum::{
  Router,
  routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};
use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{prelude::*, state::AppState};

#[tokio::main]
async fn main() {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "vantex=debug,tower_http=debug,axum=trace,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let admins: HashSet<i64> = env::var("ADMIN_IDS")
    .expect("ADMIN_IDS not set")
    .split(',')
    .filter(|s| !s.trim().is_empty())
    .map(|id| id.trim().parse().expect("Invalid Admin ID format"))
    .collect();

  let db_url = env::var("DATABASE_URL")
    .unwrap_or_else(|_| "sqlite:vantex.db?mode=rwc".into());
  let secret = env::var("SERVER_SECRET").expect("SERVER_SECRET not set");

  info!("Starting Vantex Affiliate Server v{}", env!("CARGO_PKG_VERSION"));

  let app_state = Arc::new(AppState::new(&db_url, admins, secret).await);

  let governor_conf = Arc::new(
    GovernorConfigBuilder::default()
      .per_second(2)
      .burst_size(100)
      .finish()
      .expect("Failed to build rate limiter config"),
  );

  let governor_limiter = governor_conf.limiter().clone();

  tokio::spawn(async move {
    loop {
      tokio::time::sleep(Duration::from_secs(60)).await;
      governor_limiter.retain_recent();
    }
  });

  let app = Router::new()
    .route("/api/affiliates/register", post(handlers::register))
    .route("/api/affiliates/downlines", post(handlers::add_downline))
    .route(
      "/api/affiliates/{code}/downlines",
      get(handlers::affiliate_downlines),
    )
    .route(
      "/api/admin/affiliates/pending",
      get(handlers::pending_affiliates),
    )
    .route("/api/admin/affiliates", get(handlers::all_affiliates))
    .route(
      "/api/admin/affiliates/{id}/approve",
      put(handlers::approve_affiliate),
    )
    .route(
      "/api/admin/affiliates/{id}/reject",
      put(handlers::reject_affiliate),
    )
    .route(
      "/api/admin/affiliates/{id}/status",
      put(handlers::update_affiliate_status),
    )
    .route(
      "/api/admin/downlines",
      get(handlers::all_downlines).post(handlers::add_downline_manually),
    )
    .route("/health", get(handlers::health))
    .layer(
      ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(GovernorLayer::new(governor_conf))
        .layer(
          CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        ),
    )
    .with_state(app_state)
    .into_make_service_with_connect_info::<SocketAddr>();

  let port: u16 =
    env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3000);
  let addr = SocketAddr::from(([0, 0, 0, 0], port));

  info!("HTTP server listening on {}", addr);

  let listener =
    tokio::net::TcpListener::bind(addr).await.expect("Failed to bind");
  axum::serve(listener, app).await.expect("Server error");
}
