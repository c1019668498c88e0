//! Day End Process: per-date reconciliation of planned field tasks against
//! submitted DJI records, and the mutation that closes out the day.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::DsmsApi;
use crate::endpoint::{EndpointDef, Verb};
use crate::tags::{TagSpec, TagType};
use crate::transport::ApiError;

pub static DAY_END_SUMMARY: EndpointDef = EndpointDef::node_query(
  "getDayEndSummary",
  Verb::Get,
  "/day-end",
  &[TagSpec::Bare(TagType::DayEnd), TagSpec::Keyed(TagType::DayEnd)],
);

pub static COMPLETE_DAY_END: EndpointDef = EndpointDef::node_mutation(
  "completeDayEnd",
  "/day-end/complete",
  &[
    TagSpec::Bare(TagType::DayEnd),
    TagSpec::Bare(TagType::TaskReports),
    TagSpec::Bare(TagType::Reports),
  ],
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayEndSummary {
  pub date: String,
  pub estates: Vec<EstateDayEnd>,
  /// True once every field task has a matching DJI record.
  pub reconciled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstateDayEnd {
  pub estate_id: i64,
  pub estate: String,
  pub fields: Vec<FieldTaskReview>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldTaskReview {
  pub task_id: i64,
  pub field_id: i64,
  pub field: String,
  pub planned_extent: f64,
  pub sprayed_extent: f64,
  pub records: Vec<DjiRecordSummary>,
  pub matched: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DjiRecordSummary {
  pub id: i64,
  pub pilot: String,
  pub drone_serial: String,
  pub sprayed_extent: f64,
}

impl DsmsApi {
  /// Reconciliation tree for a date (`YYYY-MM-DD`). Keyed per date so
  /// closing one day leaves other days' cached trees alone.
  pub async fn day_end_summary(&self, date: &str) -> Result<DayEndSummary, ApiError> {
    let request = DAY_END_SUMMARY
      .request(json!({ "date": date }))
      .with_tag_id(date);
    self.fetch(request).await
  }

  /// Close out a day. Rejected by the backend while unmatched tasks
  /// remain, so callers should confirm reconciliation first.
  pub async fn complete_day_end(&self, date: &str) -> Result<(), ApiError> {
    let request = COMPLETE_DAY_END.request(json!({ "date": date }));
    let _: serde_json::Value = self.mutate(request).await?;
    Ok(())
  }
}
