//! HTTP transport adapter.
//!
//! Turns a bound [`ApiRequest`] into an HTTP call against the correct
//! backend, with bearer auth and content-type negotiation, and surfaces a
//! uniform result shape: the parsed JSON payload on success, an
//! [`ApiError`] carrying status and payload otherwise. Every failure is
//! logged here, once, with endpoint name, status, and payload; this is the
//! only cross-cutting observability point in the layer.
//!
//! No retries and no per-request timeout overrides: client-construction
//! defaults apply.

use reqwest::multipart::Form;
use reqwest::{Client, ClientBuilder, StatusCode};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::error;
use url::Url;

use crate::config::{ApiBases, Config};
use crate::endpoint::{ApiRequest, Backend, BodyEncoding, Verb};
use crate::session::SessionStore;

/// Structured error shape returned to calling code.
///
/// `status` is `None` for transport-level failures (no HTTP response) and
/// for client-side decode failures; otherwise it carries the HTTP status.
/// `data` holds the error payload: the response body when there was one, a
/// message otherwise.
#[derive(Debug, Clone)]
pub struct ApiError {
  pub status: Option<u16>,
  pub data: Value,
}

impl ApiError {
  pub fn transport(message: impl fmt::Display) -> Self {
    Self {
      status: None,
      data: Value::String(message.to_string()),
    }
  }

  pub fn http(status: StatusCode, data: Value) -> Self {
    Self {
      status: Some(status.as_u16()),
      data,
    }
  }

  pub fn decode(message: impl fmt::Display) -> Self {
    Self {
      status: None,
      data: Value::String(format!("Failed to decode response: {}", message)),
    }
  }

  /// Application-level failure flag in an otherwise successful response.
  pub fn application(payload: Value) -> Self {
    Self {
      status: None,
      data: payload,
    }
  }

  /// Best-effort human-readable message from the error payload.
  pub fn message(&self) -> String {
    match &self.data {
      Value::String(s) => s.clone(),
      Value::Object(map) => map
        .get("message")
        .or_else(|| map.get("error"))
        .and_then(|v| v.as_str())
        .map(String::from)
        .unwrap_or_else(|| self.data.to_string()),
      other => other.to_string(),
    }
  }
}

impl fmt::Display for ApiError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.status {
      Some(status) => write!(f, "API error ({}): {}", status, self.message()),
      None => write!(f, "API error: {}", self.message()),
    }
  }
}

impl std::error::Error for ApiError {}

/// HTTP transport over the two backends.
#[derive(Debug, Clone)]
pub struct Transport {
  http: Client,
  bases: ApiBases,
  session: SessionStore,
}

impl Transport {
  pub fn new(config: &Config, session: SessionStore) -> color_eyre::Result<Self> {
    let bases = config.api_bases()?;
    let http = build_client()?;

    Ok(Self {
      http,
      bases,
      session,
    })
  }

  fn base(&self, backend: Backend) -> &Url {
    match backend {
      Backend::Primary => &self.bases.primary,
      Backend::Node => &self.bases.node,
    }
  }

  fn endpoint_url(&self, backend: Backend, path: &str) -> Result<Url, ApiError> {
    let mut url = self.base(backend).clone();
    {
      let mut segments = url
        .path_segments_mut()
        .map_err(|_| ApiError::transport("Base URL cannot be a base"))?;
      segments.pop_if_empty();
      for segment in path.split('/').filter(|s| !s.is_empty()) {
        segments.push(segment);
      }
    }
    Ok(url)
  }

  /// Execute a logical request and return its parsed JSON payload.
  pub async fn execute(&self, request: &ApiRequest) -> Result<Value, ApiError> {
    let def = request.def;
    let url = self.endpoint_url(def.backend, &request.path)?;

    let mut builder = match def.verb {
      // Node GETs carry their arguments as query parameters.
      Verb::Get => {
        let mut b = self.http.get(url);
        if matches!(&request.args, Value::Object(map) if !map.is_empty()) {
          b = b.query(&form_fields(&request.args));
        }
        b
      }
      Verb::Post => self.http.post(url),
    };

    // Token is read fresh from the store on every request.
    if let Some(token) = self.session.token() {
      builder = builder.bearer_auth(token);
    }

    builder = match def.encoding {
      BodyEncoding::Json => builder.json(&request.args),
      // Form endpoints get no explicit content type beyond what the
      // encoder sets; the args object is flattened to string fields.
      BodyEncoding::Form => builder.form(&form_fields(&request.args)),
      BodyEncoding::Empty => builder,
    };

    self.settle(def.name, builder).await
  }

  /// Submit a multipart form through a raw request.
  ///
  /// Used by exactly two operations: DJI record submission and DJI image
  /// upload. The bearer token is attached manually and no Content-Type is
  /// set, leaving the multipart boundary to the client library.
  pub async fn upload(
    &self,
    endpoint: &'static str,
    backend: Backend,
    path: &str,
    form: Form,
  ) -> Result<Value, ApiError> {
    let url = self.endpoint_url(backend, path)?;

    let mut builder = self.http.post(url).multipart(form);
    if let Some(token) = self.session.token() {
      builder = builder.bearer_auth(token);
    }

    self.settle(endpoint, builder).await
  }

  /// Send, then normalize the outcome to `{data}` / `{error}` and log
  /// failures centrally.
  async fn settle(
    &self,
    endpoint: &'static str,
    builder: reqwest::RequestBuilder,
  ) -> Result<Value, ApiError> {
    let response = match builder.send().await {
      Ok(r) => r,
      Err(e) => {
        error!(endpoint, error = %e, "request failed before a response arrived");
        return Err(ApiError::transport(e));
      }
    };

    let status = response.status();
    let body = match response.text().await {
      Ok(b) => b,
      Err(e) => {
        error!(endpoint, status = status.as_u16(), error = %e, "failed to read response body");
        return Err(ApiError::transport(e));
      }
    };

    let parsed = serde_json::from_str::<Value>(&body);
    let payload = match &parsed {
      Ok(v) => v.clone(),
      Err(_) => Value::String(body.clone()),
    };

    if !status.is_success() {
      error!(
        endpoint,
        status = status.as_u16(),
        payload = %payload,
        "request failed"
      );
      return Err(ApiError::http(status, payload));
    }

    if parsed.is_err() {
      // An empty body on success reads as null data (some Node mutations
      // return nothing); any other unparseable body is a decode failure.
      if body.trim().is_empty() {
        return Ok(Value::Null);
      }
      error!(endpoint, status = status.as_u16(), "response was not valid JSON");
      return Err(ApiError::decode("response was not valid JSON"));
    }

    Ok(payload)
  }
}

fn build_client() -> color_eyre::Result<Client> {
  ClientBuilder::new()
    .connect_timeout(Duration::from_secs(10))
    .pool_idle_timeout(Duration::from_secs(90))
    .use_rustls_tls()
    .user_agent(concat!("dsms/", env!("CARGO_PKG_VERSION")))
    .build()
    .map_err(|e| color_eyre::eyre::eyre!("Failed to create HTTP client: {}", e))
}

/// Flatten a JSON object into form fields. Nested values are serialized as
/// JSON strings, matching how the original front-end filled FormData.
fn form_fields(args: &Value) -> Vec<(String, String)> {
  match args {
    Value::Object(map) => map
      .iter()
      .map(|(k, v)| {
        let value = match v {
          Value::String(s) => s.clone(),
          other => other.to_string(),
        };
        (k.clone(), value)
      })
      .collect(),
    _ => Vec::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn form_fields_flatten_scalars_without_quoting() {
    let fields = form_fields(&json!({
      "name": "Battery B-7",
      "team_id": 12,
      "active": true,
    }));

    assert!(fields.contains(&("name".to_string(), "Battery B-7".to_string())));
    assert!(fields.contains(&("team_id".to_string(), "12".to_string())));
    assert!(fields.contains(&("active".to_string(), "true".to_string())));
  }

  #[test]
  fn api_error_message_prefers_message_field() {
    let err = ApiError::http(
      StatusCode::UNAUTHORIZED,
      json!({"message": "Token expired", "code": 401}),
    );
    assert_eq!(err.message(), "Token expired");
    assert_eq!(err.status, Some(401));
  }

  #[test]
  fn transport_error_has_no_status() {
    let err = ApiError::transport("connection refused");
    assert_eq!(err.status, None);
    assert!(err.to_string().contains("connection refused"));
  }
}
