//! Fleet-level equipment pool: unallocated equipment available for
//! temporary assignment to teams.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{args, DsmsApi};
use crate::endpoint::{EndpointDef, Verb};
use crate::tags::{TagSpec, TagType};
use crate::transport::ApiError;

pub static FLEET_EQUIPMENT: EndpointDef = EndpointDef::node_query(
  "getFleetEquipment",
  Verb::Get,
  "/fleet-equipment",
  &[TagSpec::Bare(TagType::FleetEquipment)],
);

pub static REGISTER_EQUIPMENT: EndpointDef = EndpointDef::node_mutation(
  "registerFleetEquipment",
  "/fleet-equipment",
  &[
    TagSpec::Bare(TagType::FleetEquipment),
    TagSpec::Bare(TagType::Assets),
  ],
);

pub static RETIRE_EQUIPMENT: EndpointDef = EndpointDef::node_mutation(
  "retireFleetEquipment",
  "/fleet-equipment/retire",
  &[
    TagSpec::Bare(TagType::FleetEquipment),
    TagSpec::Bare(TagType::Assets),
  ],
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetEquipmentItem {
  pub id: i64,
  pub equipment_type: String,
  pub serial_no: String,
  pub available: bool,
  #[serde(default)]
  pub allocated_team_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EquipmentDraft {
  pub equipment_type: String,
  pub serial_no: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub supplier_id: Option<i64>,
}

impl DsmsApi {
  pub async fn fleet_equipment(&self, only_available: bool) -> Result<Vec<FleetEquipmentItem>, ApiError> {
    let query = if only_available {
      json!({ "available": true })
    } else {
      json!({})
    };
    self.fetch(FLEET_EQUIPMENT.request(query)).await
  }

  pub async fn register_fleet_equipment(&self, draft: &EquipmentDraft) -> Result<FleetEquipmentItem, ApiError> {
    self.mutate(REGISTER_EQUIPMENT.request(args(draft)?)).await
  }

  pub async fn retire_fleet_equipment(&self, equipment_id: i64) -> Result<(), ApiError> {
    let request = RETIRE_EQUIPMENT.request(json!({ "equipment_id": equipment_id }));
    let _: serde_json::Value = self.mutate(request).await?;
    Ok(())
  }
}
