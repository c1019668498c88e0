//! Farmer bookings and ASC (Agrarian Service Centre) bookings, plus the
//! reference data the booking forms need: time slots, cancellation
//! reasons, and ASC centres.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{args, DsmsApi, Envelope};
use crate::endpoint::EndpointDef;
use crate::tags::{TagSpec, TagType};
use crate::transport::ApiError;

pub static LIST_BOOKINGS: EndpointDef = EndpointDef::query(
  "getBookings",
  "/booking/list",
  &[TagSpec::Bare(TagType::Bookings)],
);

pub static ASC_BOOKINGS: EndpointDef = EndpointDef::query(
  "getAscBookings",
  "/booking/asc/list",
  &[TagSpec::Bare(TagType::AscBookings)],
);

pub static CREATE_BOOKING: EndpointDef = EndpointDef::mutation(
  "createBooking",
  "/booking/create",
  &[
    TagSpec::Bare(TagType::Bookings),
    TagSpec::Bare(TagType::Calendar),
  ],
);

pub static CANCEL_BOOKING: EndpointDef = EndpointDef::mutation(
  "cancelBooking",
  "/booking/cancel",
  &[
    TagSpec::Bare(TagType::Bookings),
    TagSpec::Bare(TagType::AscBookings),
    TagSpec::Bare(TagType::Calendar),
  ],
);

pub static TIME_SLOTS: EndpointDef = EndpointDef::query(
  "getTimeSlots",
  "/booking/time-slots",
  &[TagSpec::Bare(TagType::TimeSlots)],
);

pub static REASONS: EndpointDef = EndpointDef::query(
  "getReasons",
  "/booking/reasons",
  &[TagSpec::Bare(TagType::Reasons)],
);

pub static ASC_CENTRES: EndpointDef =
  EndpointDef::query("getAscCentres", "/asc/list", &[TagSpec::Bare(TagType::Asc)]);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
  pub id: i64,
  pub farmer_id: i64,
  pub farmer: String,
  pub booking_date: String,
  #[serde(default)]
  pub time_slot: Option<String>,
  pub status: String,
  /// Extent to treat, in hectares.
  pub extent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingDraft {
  pub farmer_id: i64,
  pub booking_date: String,
  pub time_slot_id: i64,
  pub extent: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub asc_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
  pub id: i64,
  pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reason {
  pub id: i64,
  pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AscCentre {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub district: Option<String>,
}

impl DsmsApi {
  pub async fn bookings(&self, from: &str, to: &str) -> Result<Vec<Booking>, ApiError> {
    let envelope: Envelope<Vec<Booking>> = self
      .fetch(LIST_BOOKINGS.request(json!({ "from": from, "to": to })))
      .await?;
    envelope.into_data()
  }

  pub async fn asc_bookings(&self, asc_id: i64) -> Result<Vec<Booking>, ApiError> {
    let envelope: Envelope<Vec<Booking>> = self
      .fetch(ASC_BOOKINGS.request(json!({ "asc_id": asc_id })))
      .await?;
    envelope.into_data()
  }

  pub async fn create_booking(&self, draft: &BookingDraft) -> Result<Booking, ApiError> {
    let envelope: Envelope<Booking> = self.mutate(CREATE_BOOKING.request(args(draft)?)).await?;
    envelope.into_data()
  }

  pub async fn cancel_booking(&self, booking_id: i64, reason_id: i64) -> Result<(), ApiError> {
    let request =
      CANCEL_BOOKING.request(json!({ "booking_id": booking_id, "reason_id": reason_id }));
    let envelope: Envelope<serde_json::Value> = self.mutate(request).await?;
    envelope.into_data().map(|_| ())
  }

  pub async fn time_slots(&self) -> Result<Vec<TimeSlot>, ApiError> {
    let envelope: Envelope<Vec<TimeSlot>> = self.fetch(TIME_SLOTS.request(json!({}))).await?;
    envelope.into_data()
  }

  pub async fn cancellation_reasons(&self) -> Result<Vec<Reason>, ApiError> {
    let envelope: Envelope<Vec<Reason>> = self.fetch(REASONS.request(json!({}))).await?;
    envelope.into_data()
  }

  pub async fn asc_centres(&self) -> Result<Vec<AscCentre>, ApiError> {
    let envelope: Envelope<Vec<AscCentre>> = self.fetch(ASC_CENTRES.request(json!({}))).await?;
    envelope.into_data()
  }
}
