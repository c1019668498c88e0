//! Field-task completion review: per-task reports, pilot performance, and
//! the stage/chemical reference data task forms use.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{DsmsApi, Envelope};
use crate::endpoint::EndpointDef;
use crate::tags::{TagSpec, TagType};
use crate::transport::ApiError;

pub static TASK_REPORTS: EndpointDef = EndpointDef::query(
  "getTaskReports",
  "/task/reports",
  &[TagSpec::Bare(TagType::TaskReports)],
);

pub static PILOT_PERFORMANCE: EndpointDef = EndpointDef::query(
  "getPilotPerformance",
  "/task/pilot-performance",
  &[TagSpec::Bare(TagType::PilotPerformance)],
);

pub static STAGES: EndpointDef =
  EndpointDef::query("getStages", "/task/stages", &[TagSpec::Bare(TagType::Stages)]);

pub static CHEMICAL_TYPES: EndpointDef = EndpointDef::query(
  "getChemicalTypes",
  "/task/chemical-types",
  &[TagSpec::Bare(TagType::ChemicalTypes)],
);

pub static UPDATE_TASK_STATUS: EndpointDef = EndpointDef::mutation(
  "updateTaskStatus",
  "/task/update-status",
  &[
    TagSpec::Bare(TagType::TaskReports),
    TagSpec::Bare(TagType::Reports),
  ],
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
  pub task_id: i64,
  pub field_id: i64,
  pub field: String,
  pub estate: String,
  pub task_date: String,
  pub status: String,
  pub planned_extent: f64,
  pub completed_extent: f64,
  #[serde(default)]
  pub pilot: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PilotPerformanceRow {
  pub pilot_id: i64,
  pub pilot: String,
  pub tasks_completed: u32,
  pub extent: f64,
  #[serde(default)]
  pub average_extent_per_day: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
  pub id: i64,
  pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChemicalType {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub unit: Option<String>,
}

impl DsmsApi {
  pub async fn task_reports(&self, date: &str, estate_id: Option<i64>) -> Result<Vec<TaskReport>, ApiError> {
    let body = match estate_id {
      Some(id) => json!({ "date": date, "estate_id": id }),
      None => json!({ "date": date }),
    };
    let envelope: Envelope<Vec<TaskReport>> = self.fetch(TASK_REPORTS.request(body)).await?;
    envelope.into_data()
  }

  pub async fn pilot_performance(&self, month: &str) -> Result<Vec<PilotPerformanceRow>, ApiError> {
    let envelope: Envelope<Vec<PilotPerformanceRow>> = self
      .fetch(PILOT_PERFORMANCE.request(json!({ "month": month })))
      .await?;
    envelope.into_data()
  }

  pub async fn stages(&self) -> Result<Vec<Stage>, ApiError> {
    let envelope: Envelope<Vec<Stage>> = self.fetch(STAGES.request(json!({}))).await?;
    envelope.into_data()
  }

  pub async fn chemical_types(&self) -> Result<Vec<ChemicalType>, ApiError> {
    let envelope: Envelope<Vec<ChemicalType>> = self.fetch(CHEMICAL_TYPES.request(json!({}))).await?;
    envelope.into_data()
  }

  pub async fn update_task_status(&self, task_id: i64, status: &str) -> Result<(), ApiError> {
    let request = UPDATE_TASK_STATUS.request(json!({ "task_id": task_id, "status": status }));
    let envelope: Envelope<serde_json::Value> = self.mutate(request).await?;
    envelope.into_data().map(|_| ())
  }
}
