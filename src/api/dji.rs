//! DJI imagery: listing uploaded images, and the two multipart operations
//! that submit reconciliation records and imagery during day-end
//! processing. These two bypass JSON encoding and go through the
//! transport's raw upload path.

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::DsmsApi;
use crate::endpoint::{EndpointDef, Verb};
use crate::tags::{TagSpec, TagType};
use crate::transport::ApiError;

pub static DJI_IMAGES: EndpointDef = EndpointDef::node_query(
  "getDjiImages",
  Verb::Get,
  "/dji/images",
  &[TagSpec::Bare(TagType::DjiImages)],
);

/// Multipart: scalar fields plus the flight-report image.
pub static SUBMIT_DJI_RECORD: EndpointDef = EndpointDef::node_mutation(
  "submitDjiRecord",
  "/dji/records",
  &[
    TagSpec::Bare(TagType::DayEnd),
    TagSpec::Bare(TagType::DjiImages),
    TagSpec::Bare(TagType::TaskReports),
  ],
);

/// Multipart: a single image file tied to a task.
pub static UPLOAD_DJI_IMAGE: EndpointDef = EndpointDef::node_mutation(
  "uploadDjiImage",
  "/dji/images",
  &[TagSpec::Bare(TagType::DjiImages)],
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DjiImage {
  pub id: i64,
  pub task_id: i64,
  pub file_name: String,
  pub uploaded_at: String,
  #[serde(default)]
  pub url: Option<String>,
}

/// Pilot-vs-drone-imagery reconciliation data for one field task.
#[derive(Debug, Clone, Serialize)]
pub struct DjiRecord {
  pub task_id: i64,
  pub field_id: i64,
  pub pilot_id: i64,
  pub drone_serial: String,
  /// Extent the drone log reports as sprayed, in hectares.
  pub sprayed_extent: f64,
  pub flight_date: String,
}

impl DsmsApi {
  pub async fn dji_images(&self, task_id: i64) -> Result<Vec<DjiImage>, ApiError> {
    self
      .fetch(DJI_IMAGES.request(json!({ "task_id": task_id })))
      .await
  }

  /// Submit a reconciliation record with its flight-report image.
  pub async fn submit_dji_record(
    &self,
    record: &DjiRecord,
    file_name: &str,
    file_bytes: Vec<u8>,
  ) -> Result<serde_json::Value, ApiError> {
    let form = Form::new()
      .text("task_id", record.task_id.to_string())
      .text("field_id", record.field_id.to_string())
      .text("pilot_id", record.pilot_id.to_string())
      .text("drone_serial", record.drone_serial.clone())
      .text("sprayed_extent", record.sprayed_extent.to_string())
      .text("flight_date", record.flight_date.clone())
      .part("file", Part::bytes(file_bytes).file_name(file_name.to_string()));

    self
      .upload_mutation(&SUBMIT_DJI_RECORD, SUBMIT_DJI_RECORD.path, form, None)
      .await
  }

  /// Upload a DJI image for a task.
  pub async fn upload_dji_image(
    &self,
    task_id: i64,
    file_name: &str,
    file_bytes: Vec<u8>,
  ) -> Result<DjiImage, ApiError> {
    let form = Form::new()
      .text("task_id", task_id.to_string())
      .part("file", Part::bytes(file_bytes).file_name(file_name.to_string()));

    self
      .upload_mutation(&UPLOAD_DJI_IMAGE, UPLOAD_DJI_IMAGE.path, form, None)
      .await
  }
}
