//! Declarative endpoint registry.
//!
//! Every endpoint is a static descriptor: verb, backend, path, body
//! encoding, and the tag specs it provides (queries) or invalidates
//! (mutations). Descriptors are immutable after declaration; binding one to
//! concrete arguments yields an [`ApiRequest`], whose fingerprint identifies
//! the cached result.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::tags::{resolve_specs, Tag, TagSpec};

/// Which backend serves an endpoint.
///
/// The primary API is POST-only with JSON bodies, reads included. The Node
/// backend mixes GET and POST and owns the equipment, stock, DJI-image, and
/// day-end domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
  Primary,
  Node,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
  Get,
  Post,
}

/// How the request body is encoded. Multipart uploads are not an encoding;
/// the two DJI operations that need them go through the transport's
/// dedicated upload path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
  Json,
  Form,
  Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
  Query,
  Mutation,
}

/// Static endpoint descriptor.
#[derive(Debug)]
pub struct EndpointDef {
  pub name: &'static str,
  pub backend: Backend,
  pub verb: Verb,
  pub path: &'static str,
  pub encoding: BodyEncoding,
  pub kind: EndpointKind,
  /// Tags a query registers its result under.
  pub provides: &'static [TagSpec],
  /// Tags a mutation marks stale on success.
  pub invalidates: &'static [TagSpec],
}

impl EndpointDef {
  /// Declare a primary-API query (POST, JSON body).
  pub const fn query(name: &'static str, path: &'static str, provides: &'static [TagSpec]) -> Self {
    Self {
      name,
      backend: Backend::Primary,
      verb: Verb::Post,
      path,
      encoding: BodyEncoding::Json,
      kind: EndpointKind::Query,
      provides,
      invalidates: &[],
    }
  }

  /// Declare a primary-API mutation (POST, JSON body).
  pub const fn mutation(
    name: &'static str,
    path: &'static str,
    invalidates: &'static [TagSpec],
  ) -> Self {
    Self {
      name,
      backend: Backend::Primary,
      verb: Verb::Post,
      path,
      encoding: BodyEncoding::Json,
      kind: EndpointKind::Mutation,
      provides: &[],
      invalidates,
    }
  }

  /// Declare a primary-API mutation that submits a URL-encoded form
  /// instead of JSON (the handful of legacy form endpoints).
  pub const fn form_mutation(
    name: &'static str,
    path: &'static str,
    invalidates: &'static [TagSpec],
  ) -> Self {
    Self {
      name,
      backend: Backend::Primary,
      verb: Verb::Post,
      path,
      encoding: BodyEncoding::Form,
      kind: EndpointKind::Mutation,
      provides: &[],
      invalidates,
    }
  }

  /// Declare a Node-backend query.
  pub const fn node_query(
    name: &'static str,
    verb: Verb,
    path: &'static str,
    provides: &'static [TagSpec],
  ) -> Self {
    Self {
      name,
      backend: Backend::Node,
      verb,
      path,
      encoding: match verb {
        Verb::Get => BodyEncoding::Empty,
        Verb::Post => BodyEncoding::Json,
      },
      kind: EndpointKind::Query,
      provides,
      invalidates: &[],
    }
  }

  /// Declare a Node-backend mutation.
  pub const fn node_mutation(
    name: &'static str,
    path: &'static str,
    invalidates: &'static [TagSpec],
  ) -> Self {
    Self {
      name,
      backend: Backend::Node,
      verb: Verb::Post,
      path,
      encoding: BodyEncoding::Json,
      kind: EndpointKind::Mutation,
      provides: &[],
      invalidates,
    }
  }

  /// Bind this endpoint to concrete arguments.
  pub fn request(&'static self, args: Value) -> ApiRequest {
    ApiRequest {
      def: self,
      path: self.path.to_string(),
      args,
      tag_id: None,
    }
  }
}

/// An endpoint bound to concrete arguments, ready for the transport and the
/// cache engine.
#[derive(Debug, Clone)]
pub struct ApiRequest {
  pub def: &'static EndpointDef,
  /// Resolved request path; differs from `def.path` when the endpoint
  /// embeds ids in the path (Node GETs).
  pub path: String,
  pub args: Value,
  /// Id used to resolve `Keyed` tag specs.
  pub tag_id: Option<String>,
}

impl ApiRequest {
  /// Override the path, for endpoints with path parameters.
  pub fn at(mut self, path: impl Into<String>) -> Self {
    self.path = path.into();
    self
  }

  /// Attach the id that `Keyed` tag specs resolve against.
  pub fn with_tag_id(mut self, id: impl ToString) -> Self {
    self.tag_id = Some(id.to_string());
    self
  }

  /// Identity of the cached result: endpoint name, resolved path, and
  /// serialized arguments, hashed for a stable fixed-length key. The path
  /// participates so endpoints that embed ids in the path fingerprint per
  /// entity.
  pub fn fingerprint(&self) -> Fingerprint {
    Fingerprint::of(self.def.name, &self.path, &self.args)
  }

  pub fn provided_tags(&self) -> Vec<Tag> {
    resolve_specs(self.def.provides, self.tag_id.as_deref())
  }

  pub fn invalidated_tags(&self) -> Vec<Tag> {
    resolve_specs(self.def.invalidates, self.tag_id.as_deref())
  }
}

/// Request fingerprint: SHA-256 over endpoint name, path, and canonical
/// argument serialization. `serde_json` object keys are ordered, so
/// identical arguments always produce identical fingerprints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
  pub fn of(endpoint: &str, path: &str, args: &Value) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(endpoint.as_bytes());
    hasher.update(b":");
    hasher.update(path.as_bytes());
    hasher.update(b":");
    hasher.update(args.to_string().as_bytes());
    Fingerprint(hex::encode(hasher.finalize()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tags::TagType;
  use serde_json::json;

  static PLAN_DETAILS: EndpointDef = EndpointDef::query(
    "planDetails",
    "/plan/details",
    &[TagSpec::Keyed(TagType::PlanDetails)],
  );

  static CREATE_PLAN: EndpointDef = EndpointDef::mutation(
    "createPlan",
    "/plan/create",
    &[TagSpec::Bare(TagType::Plans), TagSpec::Bare(TagType::Calendar)],
  );

  #[test]
  fn fingerprint_is_stable_for_identical_args() {
    let a = PLAN_DETAILS.request(json!({"plan_id": 42})).fingerprint();
    let b = PLAN_DETAILS.request(json!({"plan_id": 42})).fingerprint();
    assert_eq!(a, b);
  }

  #[test]
  fn fingerprint_distinguishes_args_and_endpoints() {
    let a = PLAN_DETAILS.request(json!({"plan_id": 42})).fingerprint();
    let b = PLAN_DETAILS.request(json!({"plan_id": 7})).fingerprint();
    let c = CREATE_PLAN.request(json!({"plan_id": 42})).fingerprint();
    assert_ne!(a, b);
    assert_ne!(a, c);
  }

  #[test]
  fn fingerprint_ignores_key_order() {
    // serde_json orders object keys, so argument maps built in different
    // orders still collapse to one fingerprint.
    let a = PLAN_DETAILS
      .request(json!({"estate": "E1", "plan_id": 42}))
      .fingerprint();
    let b = PLAN_DETAILS
      .request(json!({"plan_id": 42, "estate": "E1"}))
      .fingerprint();
    assert_eq!(a, b);
  }

  #[test]
  fn keyed_provides_resolve_against_request_id() {
    let req = PLAN_DETAILS.request(json!({"plan_id": 42})).with_tag_id(42);
    assert_eq!(req.provided_tags(), vec![Tag::keyed(TagType::PlanDetails, "42")]);
    assert!(req.invalidated_tags().is_empty());
  }

  #[test]
  fn mutation_invalidates_bare_tags() {
    let req = CREATE_PLAN.request(json!({"estate": "E1"}));
    assert_eq!(
      req.invalidated_tags(),
      vec![Tag::bare(TagType::Plans), Tag::bare(TagType::Calendar)]
    );
  }
}
