//! Spray teams and the people/aircraft allocated to them.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{DsmsApi, Envelope};
use crate::endpoint::EndpointDef;
use crate::tags::{TagSpec, TagType};
use crate::transport::ApiError;

pub static LIST_TEAMS: EndpointDef =
  EndpointDef::query("getTeams", "/team/list", &[TagSpec::Bare(TagType::Teams)]);

pub static LIST_PILOTS: EndpointDef =
  EndpointDef::query("getPilots", "/pilot/list", &[TagSpec::Bare(TagType::Pilots)]);

pub static LIST_DRONES: EndpointDef =
  EndpointDef::query("getDrones", "/drone/list", &[TagSpec::Bare(TagType::Drones)]);

pub static LIST_OPERATORS: EndpointDef = EndpointDef::query(
  "getOperators",
  "/operator/list",
  &[TagSpec::Bare(TagType::Operators)],
);

pub static ASSIGN_PILOT: EndpointDef = EndpointDef::mutation(
  "assignPilot",
  "/team/assign-pilot",
  &[TagSpec::Bare(TagType::Teams), TagSpec::Bare(TagType::Pilots)],
);

pub static ASSIGN_DRONE: EndpointDef = EndpointDef::mutation(
  "assignDrone",
  "/team/assign-drone",
  &[TagSpec::Bare(TagType::Teams), TagSpec::Bare(TagType::Drones)],
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub pilot_id: Option<i64>,
  #[serde(default)]
  pub drone_id: Option<i64>,
  #[serde(default)]
  pub operator_id: Option<i64>,
  pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pilot {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub licence_no: Option<String>,
  pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drone {
  pub id: i64,
  pub serial_no: String,
  pub model: String,
  pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operator {
  pub id: i64,
  pub name: String,
  pub active: bool,
}

impl DsmsApi {
  pub async fn teams(&self) -> Result<Vec<Team>, ApiError> {
    let envelope: Envelope<Vec<Team>> = self.fetch(LIST_TEAMS.request(json!({}))).await?;
    envelope.into_data()
  }

  pub async fn pilots(&self) -> Result<Vec<Pilot>, ApiError> {
    let envelope: Envelope<Vec<Pilot>> = self.fetch(LIST_PILOTS.request(json!({}))).await?;
    envelope.into_data()
  }

  pub async fn drones(&self) -> Result<Vec<Drone>, ApiError> {
    let envelope: Envelope<Vec<Drone>> = self.fetch(LIST_DRONES.request(json!({}))).await?;
    envelope.into_data()
  }

  pub async fn operators(&self) -> Result<Vec<Operator>, ApiError> {
    let envelope: Envelope<Vec<Operator>> = self.fetch(LIST_OPERATORS.request(json!({}))).await?;
    envelope.into_data()
  }

  pub async fn assign_pilot(&self, team_id: i64, pilot_id: i64) -> Result<(), ApiError> {
    let request = ASSIGN_PILOT.request(json!({ "team_id": team_id, "pilot_id": pilot_id }));
    let envelope: Envelope<serde_json::Value> = self.mutate(request).await?;
    envelope.into_data().map(|_| ())
  }

  pub async fn assign_drone(&self, team_id: i64, drone_id: i64) -> Result<(), ApiError> {
    let request = ASSIGN_DRONE.request(json!({ "team_id": team_id, "drone_id": drone_id }));
    let envelope: Envelope<serde_json::Value> = self.mutate(request).await?;
    envelope.into_data().map(|_| ())
  }
}
