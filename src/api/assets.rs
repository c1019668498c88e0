//! Equipment registries on the Node backend: vehicles, generators,
//! batteries, remote controls, insurance policies, and suppliers.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{args, DsmsApi};
use crate::endpoint::{EndpointDef, Verb};
use crate::tags::{TagSpec, TagType};
use crate::transport::ApiError;

pub static LIST_VEHICLES: EndpointDef = EndpointDef::node_query(
  "getVehicles",
  Verb::Get,
  "/assets/vehicles",
  &[TagSpec::Bare(TagType::Vehicles), TagSpec::Bare(TagType::Assets)],
);

pub static LIST_GENERATORS: EndpointDef = EndpointDef::node_query(
  "getGenerators",
  Verb::Get,
  "/assets/generators",
  &[TagSpec::Bare(TagType::Generators), TagSpec::Bare(TagType::Assets)],
);

pub static LIST_BATTERIES: EndpointDef = EndpointDef::node_query(
  "getBatteries",
  Verb::Get,
  "/assets/batteries",
  &[TagSpec::Bare(TagType::Batteries), TagSpec::Bare(TagType::Assets)],
);

pub static LIST_REMOTE_CONTROLS: EndpointDef = EndpointDef::node_query(
  "getRemoteControls",
  Verb::Get,
  "/assets/remote-controls",
  &[
    TagSpec::Bare(TagType::RemoteControls),
    TagSpec::Bare(TagType::Assets),
  ],
);

pub static LIST_INSURANCE: EndpointDef = EndpointDef::node_query(
  "getInsurancePolicies",
  Verb::Get,
  "/assets/insurance",
  &[TagSpec::Bare(TagType::Insurance)],
);

pub static LIST_SUPPLIERS: EndpointDef = EndpointDef::node_query(
  "getSuppliers",
  Verb::Get,
  "/assets/suppliers",
  &[TagSpec::Bare(TagType::Suppliers)],
);

pub static CREATE_SUPPLIER: EndpointDef = EndpointDef::node_mutation(
  "createSupplier",
  "/assets/suppliers",
  &[TagSpec::Bare(TagType::Suppliers)],
);

pub static RENEW_INSURANCE: EndpointDef = EndpointDef::node_mutation(
  "renewInsurance",
  "/assets/insurance/renew",
  &[TagSpec::Bare(TagType::Insurance)],
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
  pub id: i64,
  pub registration_no: String,
  pub model: String,
  pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generator {
  pub id: i64,
  pub serial_no: String,
  pub capacity_kw: f64,
  pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Battery {
  pub id: i64,
  pub serial_no: String,
  pub model: String,
  pub cycle_count: u32,
  pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteControl {
  pub id: i64,
  pub serial_no: String,
  pub model: String,
  pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsurancePolicy {
  pub id: i64,
  pub asset_type: String,
  pub asset_id: i64,
  pub policy_no: String,
  pub expires_on: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupplierDraft {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
}

impl DsmsApi {
  pub async fn vehicles(&self) -> Result<Vec<Vehicle>, ApiError> {
    self.fetch(LIST_VEHICLES.request(json!({}))).await
  }

  pub async fn generators(&self) -> Result<Vec<Generator>, ApiError> {
    self.fetch(LIST_GENERATORS.request(json!({}))).await
  }

  pub async fn batteries(&self) -> Result<Vec<Battery>, ApiError> {
    self.fetch(LIST_BATTERIES.request(json!({}))).await
  }

  pub async fn remote_controls(&self) -> Result<Vec<RemoteControl>, ApiError> {
    self.fetch(LIST_REMOTE_CONTROLS.request(json!({}))).await
  }

  pub async fn insurance_policies(&self) -> Result<Vec<InsurancePolicy>, ApiError> {
    self.fetch(LIST_INSURANCE.request(json!({}))).await
  }

  pub async fn suppliers(&self) -> Result<Vec<Supplier>, ApiError> {
    self.fetch(LIST_SUPPLIERS.request(json!({}))).await
  }

  pub async fn create_supplier(&self, draft: &SupplierDraft) -> Result<Supplier, ApiError> {
    self.mutate(CREATE_SUPPLIER.request(args(draft)?)).await
  }

  pub async fn renew_insurance(&self, policy_id: i64, expires_on: &str) -> Result<(), ApiError> {
    let request =
      RENEW_INSURANCE.request(json!({ "policy_id": policy_id, "expires_on": expires_on }));
    let _: serde_json::Value = self.mutate(request).await?;
    Ok(())
  }
}
