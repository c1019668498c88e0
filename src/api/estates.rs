//! Estate hierarchy reference data: plantation → region → estate →
//! division → field, plus sectors and crops.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{DsmsApi, Envelope};
use crate::endpoint::EndpointDef;
use crate::tags::{TagSpec, TagType};
use crate::transport::ApiError;

pub static PLANTATIONS: EndpointDef = EndpointDef::query(
  "getPlantations",
  "/plantation/list",
  &[TagSpec::Bare(TagType::Plantations)],
);

pub static REGIONS: EndpointDef =
  EndpointDef::query("getRegions", "/region/list", &[TagSpec::Bare(TagType::Regions)]);

pub static ESTATES: EndpointDef =
  EndpointDef::query("getEstates", "/estate/list", &[TagSpec::Bare(TagType::Estates)]);

pub static DIVISIONS: EndpointDef = EndpointDef::query(
  "getDivisions",
  "/division/list",
  &[TagSpec::Bare(TagType::Divisions)],
);

pub static FIELDS: EndpointDef =
  EndpointDef::query("getFields", "/field/list", &[TagSpec::Bare(TagType::Fields)]);

pub static SECTORS: EndpointDef =
  EndpointDef::query("getSectors", "/sector/list", &[TagSpec::Bare(TagType::Sectors)]);

pub static CROPS: EndpointDef =
  EndpointDef::query("getCrops", "/crop/list", &[TagSpec::Bare(TagType::Crops)]);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plantation {
  pub id: i64,
  pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
  pub id: i64,
  pub name: String,
  pub plantation_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Estate {
  pub id: i64,
  pub name: String,
  pub region_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Division {
  pub id: i64,
  pub name: String,
  pub estate_id: i64,
}

/// A sprayable field within a division.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldUnit {
  pub id: i64,
  pub name: String,
  pub division_id: i64,
  /// Extent in hectares.
  pub extent: f64,
  #[serde(default)]
  pub crop: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sector {
  pub id: i64,
  pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crop {
  pub id: i64,
  pub name: String,
}

impl DsmsApi {
  pub async fn plantations(&self) -> Result<Vec<Plantation>, ApiError> {
    let envelope: Envelope<Vec<Plantation>> = self.fetch(PLANTATIONS.request(json!({}))).await?;
    envelope.into_data()
  }

  pub async fn regions(&self, plantation_id: i64) -> Result<Vec<Region>, ApiError> {
    let envelope: Envelope<Vec<Region>> = self
      .fetch(REGIONS.request(json!({ "plantation_id": plantation_id })))
      .await?;
    envelope.into_data()
  }

  pub async fn estates(&self, region_id: i64) -> Result<Vec<Estate>, ApiError> {
    let envelope: Envelope<Vec<Estate>> = self
      .fetch(ESTATES.request(json!({ "region_id": region_id })))
      .await?;
    envelope.into_data()
  }

  pub async fn divisions(&self, estate_id: i64) -> Result<Vec<Division>, ApiError> {
    let envelope: Envelope<Vec<Division>> = self
      .fetch(DIVISIONS.request(json!({ "estate_id": estate_id })))
      .await?;
    envelope.into_data()
  }

  pub async fn fields(&self, division_id: i64) -> Result<Vec<FieldUnit>, ApiError> {
    let envelope: Envelope<Vec<FieldUnit>> = self
      .fetch(FIELDS.request(json!({ "division_id": division_id })))
      .await?;
    envelope.into_data()
  }

  pub async fn sectors(&self) -> Result<Vec<Sector>, ApiError> {
    let envelope: Envelope<Vec<Sector>> = self.fetch(SECTORS.request(json!({}))).await?;
    envelope.into_data()
  }

  pub async fn crops(&self) -> Result<Vec<Crop>, ApiError> {
    let envelope: Envelope<Vec<Crop>> = self.fetch(CROPS.request(json!({}))).await?;
    envelope.into_data()
  }
}
