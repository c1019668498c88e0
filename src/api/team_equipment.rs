//! Equipment allocated to spray teams, including the temporary-allocation
//! flow that borrows fleet equipment for a date range.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{args, DsmsApi};
use crate::endpoint::{EndpointDef, Verb};
use crate::tags::{TagSpec, TagType};
use crate::transport::ApiError;

pub static TEAM_EQUIPMENT: EndpointDef = EndpointDef::node_query(
  "getTeamEquipment",
  Verb::Get,
  "/team-equipment",
  &[
    TagSpec::Bare(TagType::TeamEquipment),
    TagSpec::Keyed(TagType::TeamEquipment),
  ],
);

pub static ASSIGN_BATTERY: EndpointDef = EndpointDef::node_mutation(
  "assignBattery",
  "/team-equipment/assign-battery",
  &[
    TagSpec::Keyed(TagType::TeamEquipment),
    TagSpec::Bare(TagType::Batteries),
  ],
);

pub static ALLOCATE_TEMPORARY: EndpointDef = EndpointDef::node_mutation(
  "allocateTemporaryEquipment",
  "/team-equipment/temporary",
  &[
    TagSpec::Keyed(TagType::TeamEquipment),
    TagSpec::Bare(TagType::FleetEquipment),
  ],
);

pub static RETURN_TEMPORARY: EndpointDef = EndpointDef::node_mutation(
  "returnTemporaryEquipment",
  "/team-equipment/temporary/return",
  &[
    TagSpec::Keyed(TagType::TeamEquipment),
    TagSpec::Bare(TagType::FleetEquipment),
  ],
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamEquipmentItem {
  pub id: i64,
  pub team_id: i64,
  pub equipment_type: String,
  pub serial_no: String,
  /// Set for items borrowed from the fleet pool.
  #[serde(default)]
  pub temporary_until: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemporaryAllocation {
  pub team_id: i64,
  pub equipment_id: i64,
  pub from: String,
  pub until: String,
}

impl DsmsApi {
  /// Equipment currently held by a team.
  pub async fn team_equipment(&self, team_id: i64) -> Result<Vec<TeamEquipmentItem>, ApiError> {
    let request = TEAM_EQUIPMENT
      .request(json!({}))
      .at(format!("/team-equipment/{}", team_id))
      .with_tag_id(team_id);
    self.fetch(request).await
  }

  /// Move a battery onto a team. Invalidates that team's equipment list
  /// and the battery registry; other teams' lists are untouched.
  pub async fn assign_battery(&self, team_id: i64, battery_id: i64) -> Result<(), ApiError> {
    let request = ASSIGN_BATTERY
      .request(json!({ "team_id": team_id, "battery_id": battery_id }))
      .with_tag_id(team_id);
    let _: serde_json::Value = self.mutate(request).await?;
    Ok(())
  }

  pub async fn allocate_temporary(&self, allocation: &TemporaryAllocation) -> Result<(), ApiError> {
    let request = ALLOCATE_TEMPORARY
      .request(args(allocation)?)
      .with_tag_id(allocation.team_id);
    let _: serde_json::Value = self.mutate(request).await?;
    Ok(())
  }

  pub async fn return_temporary(&self, team_id: i64, equipment_id: i64) -> Result<(), ApiError> {
    let request = RETURN_TEMPORARY
      .request(json!({ "team_id": team_id, "equipment_id": equipment_id }))
      .with_tag_id(team_id);
    let _: serde_json::Value = self.mutate(request).await?;
    Ok(())
  }
}
