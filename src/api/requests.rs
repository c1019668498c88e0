//! Service requests raised by estates, pending operations approval.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{DsmsApi, Envelope};
use crate::endpoint::EndpointDef;
use crate::tags::{TagSpec, TagType};
use crate::transport::ApiError;

pub static LIST_REQUESTS: EndpointDef = EndpointDef::query(
  "getRequests",
  "/request/list",
  &[TagSpec::Bare(TagType::Requests)],
);

pub static APPROVE_REQUEST: EndpointDef = EndpointDef::mutation(
  "approveRequest",
  "/request/approve",
  &[
    TagSpec::Bare(TagType::Requests),
    TagSpec::Bare(TagType::Plans),
    TagSpec::Bare(TagType::Calendar),
  ],
);

pub static REJECT_REQUEST: EndpointDef = EndpointDef::mutation(
  "rejectRequest",
  "/request/reject",
  &[TagSpec::Bare(TagType::Requests)],
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
  pub id: i64,
  pub estate_id: i64,
  pub estate: String,
  pub requested_date: String,
  pub mission_type_id: i64,
  pub extent: f64,
  pub status: String,
  #[serde(default)]
  pub remarks: Option<String>,
}

impl DsmsApi {
  pub async fn service_requests(&self, status: Option<&str>) -> Result<Vec<ServiceRequest>, ApiError> {
    let body = match status {
      Some(s) => json!({ "status": s }),
      None => json!({}),
    };
    let envelope: Envelope<Vec<ServiceRequest>> = self.fetch(LIST_REQUESTS.request(body)).await?;
    envelope.into_data()
  }

  /// Approving a request creates a plan, so the plan list and calendar are
  /// invalidated alongside the request list.
  pub async fn approve_request(&self, request_id: i64) -> Result<(), ApiError> {
    let request = APPROVE_REQUEST.request(json!({ "request_id": request_id }));
    let envelope: Envelope<serde_json::Value> = self.mutate(request).await?;
    envelope.into_data().map(|_| ())
  }

  pub async fn reject_request(&self, request_id: i64, reason: &str) -> Result<(), ApiError> {
    let request = REJECT_REQUEST.request(json!({ "request_id": request_id, "reason": reason }));
    let envelope: Envelope<serde_json::Value> = self.mutate(request).await?;
    envelope.into_data().map(|_| ())
  }
}
