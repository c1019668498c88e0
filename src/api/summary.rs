//! Management summary: report rows and chart series.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{args, DsmsApi, Envelope};
use crate::endpoint::EndpointDef;
use crate::tags::{TagSpec, TagType};
use crate::transport::ApiError;

pub static REPORTS: EndpointDef = EndpointDef::query(
  "getReports",
  "/summary/reports",
  &[TagSpec::Bare(TagType::Reports)],
);

pub static CHART_DATA: EndpointDef = EndpointDef::query(
  "getChartData",
  "/summary/chart-data",
  &[TagSpec::Bare(TagType::ChartData)],
);

#[derive(Debug, Clone, Default, Serialize)]
pub struct SummaryFilter {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub estate_id: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub from: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub to: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
  pub estate: String,
  pub missions: u32,
  pub extent: f64,
  pub completed_extent: f64,
  #[serde(default)]
  pub revenue: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSeries {
  pub label: String,
  pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartPoint {
  pub x: String,
  pub y: f64,
}

impl DsmsApi {
  pub async fn reports(&self, filter: &SummaryFilter) -> Result<Vec<ReportRow>, ApiError> {
    let envelope: Envelope<Vec<ReportRow>> = self.fetch(REPORTS.request(args(filter)?)).await?;
    envelope.into_data()
  }

  pub async fn chart_data(&self, filter: &SummaryFilter) -> Result<Vec<ChartSeries>, ApiError> {
    let envelope: Envelope<Vec<ChartSeries>> = self.fetch(CHART_DATA.request(args(filter)?)).await?;
    envelope.into_data()
  }
}
