//! Cache tag model: the keys linking queries to the mutations that
//! invalidate them.
//!
//! A tag is either a bare type (`Plans`) covering every query of that kind,
//! or a keyed `{type, id}` pair (`PlanDetails` for plan 42) covering a
//! single entity. Mutations declare the tags they make stale; the cache
//! engine re-fetches every subscribed query whose provided tags match.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed catalogue of tag types used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagType {
  Auth,
  Groups,
  Plantations,
  Regions,
  Estates,
  Divisions,
  Fields,
  Plans,
  Missions,
  PlanDetails,
  MissionDetails,
  Teams,
  Pilots,
  Drones,
  Operators,
  Bookings,
  AscBookings,
  Farmers,
  Reports,
  ChartData,
  TaskReports,
  PilotPerformance,
  Assets,
  Vehicles,
  Generators,
  Batteries,
  RemoteControls,
  Insurance,
  Suppliers,
  MainCategories,
  SubCategories,
  InventoryItems,
  Brokers,
  PilotRevenue,
  DefaultValues,
  Sectors,
  Crops,
  MissionTypes,
  TimeSlots,
  ChemicalTypes,
  Stages,
  Calendar,
  Reasons,
  Asc,
  Requests,
  TeamEquipment,
  FleetEquipment,
  DjiImages,
  DayEnd,
}

impl fmt::Display for TagType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

/// A concrete cache tag, bare or scoped to one entity id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
  pub ty: TagType,
  pub id: Option<String>,
}

impl Tag {
  pub fn bare(ty: TagType) -> Self {
    Self { ty, id: None }
  }

  pub fn keyed(ty: TagType, id: impl Into<String>) -> Self {
    Self {
      ty,
      id: Some(id.into()),
    }
  }

  /// Whether `self`, declared by a mutation, invalidates a query that
  /// provided `provided`.
  ///
  /// A bare invalidation matches every provided tag of the same type. A
  /// keyed invalidation matches only the exact `{type, id}` pair: it never
  /// matches a differently-keyed tag, nor a bare one.
  pub fn invalidates(&self, provided: &Tag) -> bool {
    if self.ty != provided.ty {
      return false;
    }
    match &self.id {
      None => true,
      Some(id) => provided.id.as_deref() == Some(id.as_str()),
    }
  }
}

impl fmt::Display for Tag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.id {
      Some(id) => write!(f, "{}:{}", self.ty, id),
      None => write!(f, "{}", self.ty),
    }
  }
}

/// Declarative tag specification on an endpoint definition.
///
/// `Keyed` specs are resolved by the engine against the id carried by the
/// request; endpoints never embed tag-computation logic of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagSpec {
  Bare(TagType),
  Keyed(TagType),
}

impl TagSpec {
  /// Resolve this spec into a concrete tag. `Keyed` specs resolve only when
  /// the request carries an id.
  pub fn resolve(&self, id: Option<&str>) -> Option<Tag> {
    match self {
      TagSpec::Bare(ty) => Some(Tag::bare(*ty)),
      TagSpec::Keyed(ty) => id.map(|id| Tag::keyed(*ty, id)),
    }
  }
}

/// Resolve a static spec list against a request id.
pub fn resolve_specs(specs: &[TagSpec], id: Option<&str>) -> Vec<Tag> {
  specs.iter().filter_map(|s| s.resolve(id)).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bare_invalidates_every_id() {
    let bare = Tag::bare(TagType::PlanDetails);
    assert!(bare.invalidates(&Tag::keyed(TagType::PlanDetails, "7")));
    assert!(bare.invalidates(&Tag::keyed(TagType::PlanDetails, "42")));
    assert!(bare.invalidates(&Tag::bare(TagType::PlanDetails)));
  }

  #[test]
  fn keyed_invalidates_exact_pair_only() {
    let keyed = Tag::keyed(TagType::PlanDetails, "42");
    assert!(keyed.invalidates(&Tag::keyed(TagType::PlanDetails, "42")));
    assert!(!keyed.invalidates(&Tag::keyed(TagType::PlanDetails, "7")));
    assert!(!keyed.invalidates(&Tag::bare(TagType::PlanDetails)));
  }

  #[test]
  fn types_never_cross() {
    let plans = Tag::bare(TagType::Plans);
    assert!(!plans.invalidates(&Tag::bare(TagType::Calendar)));
    assert!(!plans.invalidates(&Tag::keyed(TagType::PlanDetails, "1")));
  }

  #[test]
  fn keyed_spec_skipped_without_id() {
    let specs = [
      TagSpec::Bare(TagType::Plans),
      TagSpec::Keyed(TagType::PlanDetails),
    ];
    let with_id = resolve_specs(&specs, Some("3"));
    assert_eq!(
      with_id,
      vec![
        Tag::bare(TagType::Plans),
        Tag::keyed(TagType::PlanDetails, "3")
      ]
    );

    let without_id = resolve_specs(&specs, None);
    assert_eq!(without_id, vec![Tag::bare(TagType::Plans)]);
  }
}
