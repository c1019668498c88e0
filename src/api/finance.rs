//! Finance reference data: brokers, pilot revenue, and the default values
//! used when pricing missions.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{args, DsmsApi, Envelope};
use crate::endpoint::EndpointDef;
use crate::tags::{TagSpec, TagType};
use crate::transport::ApiError;

pub static LIST_BROKERS: EndpointDef = EndpointDef::query(
  "getBrokers",
  "/broker/list",
  &[TagSpec::Bare(TagType::Brokers)],
);

pub static CREATE_BROKER: EndpointDef = EndpointDef::mutation(
  "createBroker",
  "/broker/create",
  &[TagSpec::Bare(TagType::Brokers)],
);

pub static PILOT_REVENUE: EndpointDef = EndpointDef::query(
  "getPilotRevenue",
  "/finance/pilot-revenue",
  &[TagSpec::Bare(TagType::PilotRevenue)],
);

pub static DEFAULT_VALUES: EndpointDef = EndpointDef::query(
  "getDefaultValues",
  "/finance/default-values",
  &[TagSpec::Bare(TagType::DefaultValues)],
);

pub static UPDATE_DEFAULT_VALUES: EndpointDef = EndpointDef::mutation(
  "updateDefaultValues",
  "/finance/default-values/update",
  &[TagSpec::Bare(TagType::DefaultValues)],
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Broker {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub commission_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PilotRevenueRow {
  pub pilot_id: i64,
  pub pilot: String,
  pub month: String,
  pub missions: u32,
  /// Hectares sprayed.
  pub extent: f64,
  pub revenue: f64,
}

/// Pricing defaults applied to new plans and bookings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultValues {
  pub rate_per_hectare: f64,
  pub fuel_surcharge: f64,
  #[serde(default)]
  pub broker_commission: Option<f64>,
}

impl DsmsApi {
  pub async fn brokers(&self) -> Result<Vec<Broker>, ApiError> {
    let envelope: Envelope<Vec<Broker>> = self.fetch(LIST_BROKERS.request(json!({}))).await?;
    envelope.into_data()
  }

  pub async fn create_broker(&self, name: &str, commission_rate: f64) -> Result<Broker, ApiError> {
    let request =
      CREATE_BROKER.request(json!({ "name": name, "commission_rate": commission_rate }));
    let envelope: Envelope<Broker> = self.mutate(request).await?;
    envelope.into_data()
  }

  /// Revenue per pilot for a month (`YYYY-MM`).
  pub async fn pilot_revenue(&self, month: &str) -> Result<Vec<PilotRevenueRow>, ApiError> {
    let envelope: Envelope<Vec<PilotRevenueRow>> = self
      .fetch(PILOT_REVENUE.request(json!({ "month": month })))
      .await?;
    envelope.into_data()
  }

  pub async fn default_values(&self) -> Result<DefaultValues, ApiError> {
    let envelope: Envelope<DefaultValues> = self.fetch(DEFAULT_VALUES.request(json!({}))).await?;
    envelope.into_data()
  }

  pub async fn update_default_values(&self, values: &DefaultValues) -> Result<(), ApiError> {
    let envelope: Envelope<serde_json::Value> = self
      .mutate(UPDATE_DEFAULT_VALUES.request(args(values)?))
      .await?;
    envelope.into_data().map(|_| ())
  }
}
