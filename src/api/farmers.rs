//! Farmer registry.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{args, DsmsApi, Envelope};
use crate::endpoint::EndpointDef;
use crate::tags::{TagSpec, TagType};
use crate::transport::ApiError;

pub static LIST_FARMERS: EndpointDef = EndpointDef::query(
  "getFarmers",
  "/farmer/list",
  &[TagSpec::Bare(TagType::Farmers)],
);

pub static FARMER_DETAILS: EndpointDef = EndpointDef::query(
  "getFarmerDetails",
  "/farmer/details",
  &[TagSpec::Keyed(TagType::Farmers)],
);

// The farmer registry still lives behind legacy form handlers, so these
// two submit URL-encoded bodies rather than JSON.
pub static CREATE_FARMER: EndpointDef = EndpointDef::form_mutation(
  "createFarmer",
  "/farmer/create",
  &[TagSpec::Bare(TagType::Farmers)],
);

pub static UPDATE_FARMER: EndpointDef = EndpointDef::form_mutation(
  "updateFarmer",
  "/farmer/update",
  &[TagSpec::Bare(TagType::Farmers)],
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Farmer {
  pub id: i64,
  pub name: String,
  pub nic: String,
  #[serde(default)]
  pub phone: Option<String>,
  #[serde(default)]
  pub asc_id: Option<i64>,
  #[serde(default)]
  pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FarmerDraft {
  pub name: String,
  pub nic: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub asc_id: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub address: Option<String>,
}

impl DsmsApi {
  pub async fn farmers(&self, search: Option<&str>) -> Result<Vec<Farmer>, ApiError> {
    let body = match search {
      Some(q) => json!({ "search": q }),
      None => json!({}),
    };
    let envelope: Envelope<Vec<Farmer>> = self.fetch(LIST_FARMERS.request(body)).await?;
    envelope.into_data()
  }

  pub async fn farmer_details(&self, farmer_id: i64) -> Result<Farmer, ApiError> {
    let request = FARMER_DETAILS
      .request(json!({ "farmer_id": farmer_id }))
      .with_tag_id(farmer_id);
    let envelope: Envelope<Farmer> = self.fetch(request).await?;
    envelope.into_data()
  }

  pub async fn create_farmer(&self, draft: &FarmerDraft) -> Result<Farmer, ApiError> {
    let envelope: Envelope<Farmer> = self.mutate(CREATE_FARMER.request(args(draft)?)).await?;
    envelope.into_data()
  }

  pub async fn update_farmer(&self, farmer_id: i64, draft: &FarmerDraft) -> Result<Farmer, ApiError> {
    let mut body = args(draft)?;
    body["farmer_id"] = json!(farmer_id);
    let envelope: Envelope<Farmer> = self.mutate(UPDATE_FARMER.request(body)).await?;
    envelope.into_data()
  }
}
