//! Daily assignment of spray teams to work groups.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{DsmsApi, Envelope};
use crate::endpoint::EndpointDef;
use crate::tags::{TagSpec, TagType};
use crate::transport::ApiError;

pub static GROUP_ASSIGNMENTS: EndpointDef = EndpointDef::query(
  "getGroupAssignments",
  "/group/assignments",
  &[TagSpec::Bare(TagType::Groups)],
);

pub static ASSIGN_GROUP: EndpointDef = EndpointDef::mutation(
  "assignGroup",
  "/group/assign",
  &[TagSpec::Bare(TagType::Groups), TagSpec::Bare(TagType::Teams)],
);

pub static UNASSIGN_GROUP: EndpointDef = EndpointDef::mutation(
  "unassignGroup",
  "/group/unassign",
  &[TagSpec::Bare(TagType::Groups), TagSpec::Bare(TagType::Teams)],
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupAssignment {
  pub id: i64,
  pub group: String,
  pub team_id: i64,
  pub team: String,
  pub assigned_date: String,
}

impl DsmsApi {
  pub async fn group_assignments(&self, date: &str) -> Result<Vec<GroupAssignment>, ApiError> {
    let envelope: Envelope<Vec<GroupAssignment>> = self
      .fetch(GROUP_ASSIGNMENTS.request(json!({ "date": date })))
      .await?;
    envelope.into_data()
  }

  pub async fn assign_group(&self, group_id: i64, team_id: i64, date: &str) -> Result<(), ApiError> {
    let request =
      ASSIGN_GROUP.request(json!({ "group_id": group_id, "team_id": team_id, "date": date }));
    let envelope: Envelope<serde_json::Value> = self.mutate(request).await?;
    envelope.into_data().map(|_| ())
  }

  pub async fn unassign_group(&self, assignment_id: i64) -> Result<(), ApiError> {
    let request = UNASSIGN_GROUP.request(json!({ "assignment_id": assignment_id }));
    let envelope: Envelope<serde_json::Value> = self.mutate(request).await?;
    envelope.into_data().map(|_| ())
  }
}
