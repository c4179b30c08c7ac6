//! Admin bearer tokens: `<admin_id>.<hex hmac-sha256(admin_id)>`, keyed
//! by `SERVER_SECRET` and minted out-of-band. Full credential handling
//! (passwords, JWT) belongs to an external collaborator.

use axum::{
  extract::FromRequestParts,
  http::{header::AUTHORIZATION, request::Parts},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{prelude::*, state::AppState};

type HmacSha256 = Hmac<Sha256>;

fn sign(secret: &str, admin_id: i64) -> String {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .expect("HMAC accepts keys of any length");
  mac.update(admin_id.to_string().as_bytes());
  hex::encode(mac.finalize().into_bytes())
}

#[allow(dead_code)]
pub fn issue_token(secret: &str, admin_id: i64) -> String {
  format!("{admin_id}.{}", sign(secret, admin_id))
}

pub fn verify_token(
  secret: &str,
  admins: &HashSet<i64>,
  token: &str,
) -> Option<i64> {
  let (id, sig) = token.split_once('.')?;
  let id: i64 = id.parse().ok()?;

  if !admins.contains(&id) {
    return None;
  }

  let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
  mac.update(id.to_string().as_bytes());
  mac.verify_slice(&hex::decode(sig).ok()?).ok()?;

  Some(id)
}

/// Extracts the acting administrator's id from the `Authorization` header.
pub struct Admin(pub i64);

impl FromRequestParts<Arc<AppState>> for Admin {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &Arc<AppState>,
  ) -> Result<Self> {
    let token = parts
      .headers
      .get(AUTHORIZATION)
      .and_then(|value| value.to_str().ok())
      .and_then(|value| value.strip_prefix("Bearer "))
      .ok_or(Error::Unauthorized)?;

    verify_token(&state.secret, &state.admins, token)
      .map(Admin)
      .ok_or(Error::Unauthorized)
  }
}
