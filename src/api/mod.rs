//! Typed domain APIs over the transport adapter and the query cache.
//!
//! One module per business domain; each declares its endpoints as static
//! descriptors and exposes typed operations on [`DsmsApi`]. Queries go
//! through the cache (de-duplicated, tag-registered); mutations go straight
//! to the transport and invalidate their declared tags on success.

pub mod assets;
pub mod auth;
pub mod bookings;
pub mod day_end;
pub mod dji;
pub mod estates;
pub mod farmers;
pub mod finance;
pub mod fleet_equipment;
pub mod group_assignments;
pub mod plans;
pub mod requests;
pub mod stock_assets;
pub mod summary;
pub mod tasks;
pub mod team_equipment;
pub mod teams;

use reqwest::multipart::Form;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::cache::{fetcher, Fetcher, QueryCache, Subscription};
use crate::config::Config;
use crate::endpoint::{ApiRequest, EndpointDef, EndpointKind};
use crate::notify::{LogNotifier, Notifier};
use crate::session::SessionStore;
use crate::transport::{ApiError, Transport};

/// Client facade: transport + cache + notification port, one instance per
/// application root.
#[derive(Clone)]
pub struct DsmsApi {
  transport: Arc<Transport>,
  cache: QueryCache,
  session: SessionStore,
  notifier: Arc<dyn Notifier>,
}

impl DsmsApi {
  pub fn new(config: &Config, session: SessionStore) -> color_eyre::Result<Self> {
    let transport = Transport::new(config, session.clone())?;

    Ok(Self {
      transport: Arc::new(transport),
      cache: QueryCache::new(),
      session,
      notifier: Arc::new(LogNotifier),
    })
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
    self.notifier = notifier;
    self
  }

  pub fn cache(&self) -> &QueryCache {
    &self.cache
  }

  pub fn session(&self) -> &SessionStore {
    &self.session
  }

  pub fn notifier(&self) -> &dyn Notifier {
    self.notifier.as_ref()
  }

  fn fetcher_for(&self, request: &ApiRequest) -> Fetcher {
    let transport = self.transport.clone();
    let request = request.clone();
    fetcher(move || {
      let transport = transport.clone();
      let request = request.clone();
      async move { transport.execute(&request).await }
    })
  }

  /// Run a query through the cache and decode its payload.
  pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
    debug_assert!(request.def.kind == EndpointKind::Query);
    let value = self
      .cache
      .fetch(
        request.fingerprint(),
        request.provided_tags(),
        self.fetcher_for(&request),
      )
      .await?;
    decode(request.def.name, value)
  }

  /// Subscribe to a query: the result stays live and re-fetches whenever a
  /// mutation invalidates one of its tags.
  pub fn subscribe(&self, request: ApiRequest) -> Subscription {
    debug_assert!(request.def.kind == EndpointKind::Query);
    self.cache.subscribe(
      request.fingerprint(),
      request.provided_tags(),
      self.fetcher_for(&request),
    )
  }

  /// Execute a mutation. On success its declared tags are invalidated
  /// before this returns; mutations are never de-duplicated.
  pub async fn mutate<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
    debug_assert!(request.def.kind == EndpointKind::Mutation);
    let value = self.transport.execute(&request).await?;
    self.cache.invalidate(&request.invalidated_tags());
    decode(request.def.name, value)
  }

  /// Execute one of the two multipart mutations (DJI record submission and
  /// DJI image upload) and invalidate its declared tags.
  pub(crate) async fn upload_mutation<T: DeserializeOwned>(
    &self,
    def: &'static EndpointDef,
    path: &str,
    form: Form,
    tag_id: Option<String>,
  ) -> Result<T, ApiError> {
    let value = self
      .transport
      .upload(def.name, def.backend, path, form)
      .await?;
    self
      .cache
      .invalidate(&crate::tags::resolve_specs(def.invalidates, tag_id.as_deref()));
    decode(def.name, value)
  }
}

/// Decode a payload into a typed value.
pub(crate) fn decode<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T, ApiError> {
  serde_json::from_value(value).map_err(|e| ApiError::decode(format!("{}: {}", endpoint, e)))
}

/// Serialize request arguments.
pub(crate) fn args<T: Serialize>(value: &T) -> Result<Value, ApiError> {
  serde_json::to_value(value).map_err(|e| ApiError::decode(format!("request arguments: {}", e)))
}

/// Application-level status flag carried by primary-API responses; the
/// backend emits it as a boolean or the strings `"true"`/`"false"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StatusFlag {
  Bool(bool),
  Text(String),
}

impl StatusFlag {
  pub fn is_ok(&self) -> bool {
    match self {
      StatusFlag::Bool(b) => *b,
      StatusFlag::Text(s) => s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("success"),
    }
  }
}

/// Primary-API response envelope.
///
/// HTTP-successful responses can still carry an application-level failure
/// flag; `into_data` normalizes that case into an [`ApiError`] so callers
/// never inspect the flag themselves.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
  #[serde(default)]
  pub status: Option<StatusFlag>,
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default = "Option::default")]
  pub data: Option<T>,
}

impl<T> Envelope<T> {
  pub fn into_data(self) -> Result<T, ApiError> {
    if let Some(status) = &self.status {
      if !status.is_ok() {
        let message = self
          .message
          .unwrap_or_else(|| "request rejected by backend".to_string());
        return Err(ApiError::application(json!({ "message": message })));
      }
    }
    self
      .data
      .ok_or_else(|| ApiError::decode("response envelope carried no data"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn envelope_accepts_bool_and_string_flags() {
    let ok: Envelope<Vec<i32>> =
      serde_json::from_value(json!({"status": "true", "data": [1, 2]})).unwrap();
    assert_eq!(ok.into_data().unwrap(), vec![1, 2]);

    let ok: Envelope<Vec<i32>> =
      serde_json::from_value(json!({"status": true, "data": []})).unwrap();
    assert!(ok.into_data().unwrap().is_empty());
  }

  #[test]
  fn envelope_failure_flag_becomes_application_error() {
    let failed: Envelope<Vec<i32>> = serde_json::from_value(json!({
      "status": "false",
      "message": "estate not found",
      "data": null,
    }))
    .unwrap();

    let err = failed.into_data().unwrap_err();
    assert_eq!(err.status, None);
    assert_eq!(err.message(), "estate not found");
  }

  #[test]
  fn envelope_without_flag_is_ok() {
    let plain: Envelope<i32> = serde_json::from_value(json!({"data": 7})).unwrap();
    assert_eq!(plain.into_data().unwrap(), 7);
  }
}
