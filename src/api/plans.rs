//! Mission planning: spray plans, missions, and the planning calendar.
//!
//! Plan mutations invalidate both the list (`Plans`) and the calendar, so
//! calendar views stay consistent with newly created plans without a
//! manual refresh.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{args, DsmsApi, Envelope};
use crate::cache::Subscription;
use crate::endpoint::EndpointDef;
use crate::tags::{TagSpec, TagType};
use crate::transport::ApiError;

pub static LIST_PLANS: EndpointDef =
  EndpointDef::query("getPlans", "/plan/list", &[TagSpec::Bare(TagType::Plans)]);

pub static PLAN_DETAILS: EndpointDef = EndpointDef::query(
  "getPlanDetails",
  "/plan/details",
  &[TagSpec::Keyed(TagType::PlanDetails)],
);

pub static CREATE_PLAN: EndpointDef = EndpointDef::mutation(
  "createPlan",
  "/plan/create",
  &[TagSpec::Bare(TagType::Plans), TagSpec::Bare(TagType::Calendar)],
);

pub static UPDATE_PLAN: EndpointDef = EndpointDef::mutation(
  "updatePlan",
  "/plan/update",
  &[
    TagSpec::Bare(TagType::Plans),
    TagSpec::Keyed(TagType::PlanDetails),
    TagSpec::Bare(TagType::Calendar),
  ],
);

pub static DELETE_PLAN: EndpointDef = EndpointDef::mutation(
  "deletePlan",
  "/plan/delete",
  &[TagSpec::Bare(TagType::Plans), TagSpec::Bare(TagType::Calendar)],
);

pub static LIST_MISSIONS: EndpointDef = EndpointDef::query(
  "getMissions",
  "/mission/list",
  &[TagSpec::Bare(TagType::Missions)],
);

pub static MISSION_DETAILS: EndpointDef = EndpointDef::query(
  "getMissionDetails",
  "/mission/details",
  &[TagSpec::Keyed(TagType::MissionDetails)],
);

pub static COMPLETE_MISSION: EndpointDef = EndpointDef::mutation(
  "completeMission",
  "/mission/complete",
  &[
    TagSpec::Bare(TagType::Missions),
    TagSpec::Keyed(TagType::MissionDetails),
    TagSpec::Bare(TagType::TaskReports),
  ],
);

pub static MISSION_TYPES: EndpointDef = EndpointDef::query(
  "getMissionTypes",
  "/mission/types",
  &[TagSpec::Bare(TagType::MissionTypes)],
);

pub static CALENDAR: EndpointDef = EndpointDef::query(
  "getCalendar",
  "/plan/calendar",
  &[TagSpec::Bare(TagType::Calendar)],
);

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanFilter {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub estate_id: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub from: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub to: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
  pub id: i64,
  pub estate_id: i64,
  pub estate: String,
  pub mission_type_id: i64,
  pub spray_date: String,
  pub status: String,
  #[serde(default)]
  pub team_id: Option<i64>,
  /// Total extent planned, in hectares.
  pub extent: f64,
}

/// Payload for creating or updating a plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlanDraft {
  pub estate_id: i64,
  pub mission_type_id: i64,
  pub spray_date: String,
  pub field_ids: Vec<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub team_id: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDetails {
  pub id: i64,
  pub estate_id: i64,
  pub estate: String,
  pub mission_type_id: i64,
  pub spray_date: String,
  pub status: String,
  pub fields: Vec<PlanField>,
  #[serde(default)]
  pub team_id: Option<i64>,
  #[serde(default)]
  pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanField {
  pub field_id: i64,
  pub field: String,
  pub extent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
  pub id: i64,
  pub plan_id: i64,
  pub estate: String,
  pub mission_date: String,
  pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionDetails {
  pub id: i64,
  pub plan_id: i64,
  pub estate: String,
  pub mission_date: String,
  pub status: String,
  #[serde(default)]
  pub pilot_id: Option<i64>,
  #[serde(default)]
  pub drone_id: Option<i64>,
  pub fields: Vec<PlanField>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionType {
  pub id: i64,
  pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEntry {
  pub plan_id: i64,
  pub estate: String,
  /// Approval flag; `"ap"` marks an already-approved plan.
  #[serde(default)]
  pub flag: Option<String>,
  #[serde(default)]
  pub time_slot: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarDay {
  pub date: String,
  pub count: u32,
  pub entries: Vec<CalendarEntry>,
}

impl DsmsApi {
  pub async fn plans(&self, filter: &PlanFilter) -> Result<Vec<Plan>, ApiError> {
    let envelope: Envelope<Vec<Plan>> = self.fetch(LIST_PLANS.request(args(filter)?)).await?;
    envelope.into_data()
  }

  pub async fn plan_details(&self, plan_id: i64) -> Result<PlanDetails, ApiError> {
    let request = PLAN_DETAILS
      .request(json!({ "plan_id": plan_id }))
      .with_tag_id(plan_id);
    let envelope: Envelope<PlanDetails> = self.fetch(request).await?;
    envelope.into_data()
  }

  pub async fn create_plan(&self, draft: &PlanDraft) -> Result<Plan, ApiError> {
    let envelope: Envelope<Plan> = self.mutate(CREATE_PLAN.request(args(draft)?)).await?;
    envelope.into_data()
  }

  pub async fn update_plan(&self, plan_id: i64, draft: &PlanDraft) -> Result<Plan, ApiError> {
    let mut body = args(draft)?;
    body["plan_id"] = json!(plan_id);
    let request = UPDATE_PLAN.request(body).with_tag_id(plan_id);
    let envelope: Envelope<Plan> = self.mutate(request).await?;
    envelope.into_data()
  }

  pub async fn delete_plan(&self, plan_id: i64) -> Result<(), ApiError> {
    let envelope: Envelope<serde_json::Value> = self
      .mutate(DELETE_PLAN.request(json!({ "plan_id": plan_id })))
      .await?;
    envelope.into_data().map(|_| ())
  }

  pub async fn missions(&self, filter: &PlanFilter) -> Result<Vec<Mission>, ApiError> {
    let envelope: Envelope<Vec<Mission>> = self.fetch(LIST_MISSIONS.request(args(filter)?)).await?;
    envelope.into_data()
  }

  pub async fn mission_details(&self, mission_id: i64) -> Result<MissionDetails, ApiError> {
    let request = MISSION_DETAILS
      .request(json!({ "mission_id": mission_id }))
      .with_tag_id(mission_id);
    let envelope: Envelope<MissionDetails> = self.fetch(request).await?;
    envelope.into_data()
  }

  pub async fn complete_mission(&self, mission_id: i64) -> Result<(), ApiError> {
    let request = COMPLETE_MISSION
      .request(json!({ "mission_id": mission_id }))
      .with_tag_id(mission_id);
    let envelope: Envelope<serde_json::Value> = self.mutate(request).await?;
    envelope.into_data().map(|_| ())
  }

  pub async fn mission_types(&self) -> Result<Vec<MissionType>, ApiError> {
    let envelope: Envelope<Vec<MissionType>> = self.fetch(MISSION_TYPES.request(json!({}))).await?;
    envelope.into_data()
  }

  /// Calendar for a month (`YYYY-MM`).
  pub async fn calendar(&self, month: &str) -> Result<Vec<CalendarDay>, ApiError> {
    let envelope: Envelope<Vec<CalendarDay>> = self
      .fetch(CALENDAR.request(json!({ "month": month })))
      .await?;
    envelope.into_data()
  }

  /// Live calendar subscription; re-fetches whenever a plan mutation
  /// invalidates the calendar.
  pub fn subscribe_calendar(&self, month: &str) -> Subscription {
    self.subscribe(CALENDAR.request(json!({ "month": month })))
  }

  /// Calendar restricted to days with unapproved plans: entries flagged
  /// `"ap"` are dropped and the day count recomputed client-side. This is
  /// a distinct operation on the generic calendar payload, not a hidden
  /// response transform on the endpoint.
  pub async fn new_plan_calendar(&self, month: &str) -> Result<Vec<CalendarDay>, ApiError> {
    let days = self.calendar(month).await?;
    Ok(without_approved(days))
  }
}

/// Drop approved (`"ap"`) entries and recompute per-day counts; days left
/// empty disappear.
fn without_approved(days: Vec<CalendarDay>) -> Vec<CalendarDay> {
  days
    .into_iter()
    .map(|mut day| {
      day.entries.retain(|e| e.flag.as_deref() != Some("ap"));
      day.count = day.entries.len() as u32;
      day
    })
    .filter(|day| day.count > 0)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_plan_filter_drops_approved_entries_and_recounts() {
    let days = vec![
      CalendarDay {
        date: "2026-08-01".to_string(),
        count: 2,
        entries: vec![
          CalendarEntry {
            plan_id: 1,
            estate: "Kenilworth".to_string(),
            flag: Some("ap".to_string()),
            time_slot: None,
          },
          CalendarEntry {
            plan_id: 2,
            estate: "Kenilworth".to_string(),
            flag: None,
            time_slot: None,
          },
        ],
      },
      CalendarDay {
        date: "2026-08-02".to_string(),
        count: 1,
        entries: vec![CalendarEntry {
          plan_id: 3,
          estate: "Hatton".to_string(),
          flag: Some("ap".to_string()),
          time_slot: None,
        }],
      },
    ];

    let filtered = without_approved(days);

    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].count, 1);
    assert_eq!(filtered[0].entries[0].plan_id, 2);
  }
}
