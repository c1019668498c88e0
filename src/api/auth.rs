//! Authentication: login creates the session blob, logout destroys it and
//! drops the query cache.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{args, DsmsApi, Envelope};
use crate::endpoint::EndpointDef;
use crate::session::Session;
use crate::tags::{TagSpec, TagType};
use crate::transport::ApiError;

pub static LOGIN: EndpointDef =
  EndpointDef::mutation("login", "/login", &[TagSpec::Bare(TagType::Auth)]);

#[derive(Debug, Serialize)]
struct LoginArgs<'a> {
  username: &'a str,
  password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
  token: String,
  #[serde(default)]
  user_id: Option<i64>,
  #[serde(default)]
  user_name: Option<String>,
  #[serde(default)]
  user_level: Option<i64>,
  #[serde(default)]
  role: Option<String>,
}

impl DsmsApi {
  /// Authenticate and persist the session. Every subsequent request picks
  /// the token up from the store.
  pub async fn login(&self, username: &str, password: &str) -> Result<Session, ApiError> {
    let request = LOGIN.request(args(&LoginArgs { username, password })?);
    let envelope: Envelope<LoginPayload> = self.mutate(request).await?;
    let payload = envelope.into_data()?;

    let session = Session {
      token: payload.token,
      user_id: payload.user_id,
      user_name: payload.user_name,
      user_level: payload.user_level,
      role: payload.role,
      logged_in_at: Some(Utc::now()),
    };
    self
      .session()
      .save(&session)
      .map_err(|e| ApiError::transport(e))?;

    Ok(session)
  }

  /// Destroy the session and every cached query result.
  pub fn logout(&self) -> Result<(), ApiError> {
    self.session().clear().map_err(|e| ApiError::transport(e))?;
    self.cache().clear();
    Ok(())
  }
}
