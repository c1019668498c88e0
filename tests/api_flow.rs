//! End-to-end tests over a mock HTTP backend: cache invalidation across
//! mutations, request de-duplication, auth headers, and the multipart DJI
//! upload path.

use std::sync::atomic::{AtomicU32, Ordering};
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use dsms::api::plans::PlanDraft;
use dsms::{Config, DsmsApi, Session, SessionStore};

fn logged_in_store(dir: &tempfile::TempDir) -> SessionStore {
  let store = SessionStore::at(dir.path().join("session.json"));
  store
    .save(&Session {
      token: "test-token".to_string(),
      user_id: Some(1),
      user_name: Some("ops".to_string()),
      user_level: Some(2),
      role: Some("planner".to_string()),
      logged_in_at: None,
    })
    .unwrap();
  store
}

fn api_for(server: &MockServer, store: SessionStore) -> DsmsApi {
  let base = Url::parse(&server.uri()).unwrap();
  let config = Config::for_bases(base.clone(), base);
  DsmsApi::new(&config, store).unwrap()
}

/// Calendar payloads that change once a plan has been created.
struct CalendarResponder {
  calls: AtomicU32,
}

impl Respond for CalendarResponder {
  fn respond(&self, _request: &Request) -> ResponseTemplate {
    let n = self.calls.fetch_add(1, Ordering::SeqCst);
    let days = if n == 0 {
      serde_json::json!([])
    } else {
      serde_json::json!([{
        "date": "2026-08-12",
        "count": 1,
        "entries": [{"plan_id": 99, "estate": "Kenilworth", "flag": null, "time_slot": null}],
      }])
    };
    ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "true", "data": days}))
  }
}

#[tokio::test]
async fn calendar_refetches_after_plan_creation() {
  let server = MockServer::start().await;
  let dir = tempfile::tempdir().unwrap();
  let api = api_for(&server, logged_in_store(&dir));

  Mock::given(method("POST"))
    .and(path("/plan/calendar"))
    .respond_with(CalendarResponder {
      calls: AtomicU32::new(0),
    })
    .mount(&server)
    .await;

  Mock::given(method("POST"))
    .and(path("/plan/create"))
    .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
      "status": "true",
      "data": {
        "id": 99,
        "estate_id": 4,
        "estate": "Kenilworth",
        "mission_type_id": 1,
        "spray_date": "2026-08-12",
        "status": "pending",
        "team_id": null,
        "extent": 12.5,
      },
    })))
    .mount(&server)
    .await;

  // Mount the calendar screen: first fetch sees an empty month.
  let mut calendar = api.subscribe_calendar("2026-08");
  let value = calendar.resolved().await.unwrap();
  assert_eq!(value["data"], serde_json::json!([]));

  // Creating a plan invalidates `Calendar`; the live subscription must
  // re-fetch and show the new plan without a manual refresh.
  let draft = PlanDraft {
    estate_id: 4,
    mission_type_id: 1,
    spray_date: "2026-08-12".to_string(),
    field_ids: vec![7, 8],
    team_id: None,
    remarks: None,
  };
  let plan = api.create_plan(&draft).await.unwrap();
  assert_eq!(plan.id, 99);

  let value = calendar.resolved().await.unwrap();
  assert_eq!(value["data"][0]["entries"][0]["plan_id"], 99);
}

#[tokio::test]
async fn concurrent_identical_queries_hit_network_once() {
  let server = MockServer::start().await;
  let dir = tempfile::tempdir().unwrap();
  let api = api_for(&server, logged_in_store(&dir));

  Mock::given(method("POST"))
    .and(path("/plan/list"))
    .respond_with(
      ResponseTemplate::new(200)
        .set_body_json(serde_json::json!({"status": "true", "data": []}))
        .set_delay(std::time::Duration::from_millis(30)),
    )
    .expect(1)
    .mount(&server)
    .await;

  let filter = dsms::api::plans::PlanFilter::default();
  let (a, b) = tokio::join!(api.plans(&filter), api.plans(&filter));
  assert!(a.unwrap().is_empty());
  assert!(b.unwrap().is_empty());
}

#[tokio::test]
async fn mutations_are_never_deduplicated() {
  let server = MockServer::start().await;
  let dir = tempfile::tempdir().unwrap();
  let api = api_for(&server, logged_in_store(&dir));

  Mock::given(method("POST"))
    .and(path("/team-equipment/assign-battery"))
    .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
    .expect(2)
    .mount(&server)
    .await;

  // Two rapid identical clicks: both must reach the backend.
  api.assign_battery(12, 7).await.unwrap();
  api.assign_battery(12, 7).await.unwrap();
}

#[tokio::test]
async fn queries_carry_bearer_token_and_json_content_type() {
  let server = MockServer::start().await;
  let dir = tempfile::tempdir().unwrap();
  let api = api_for(&server, logged_in_store(&dir));

  Mock::given(method("POST"))
    .and(path("/team/list"))
    .and(header("authorization", "Bearer test-token"))
    .and(header("content-type", "application/json"))
    .respond_with(
      ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "true", "data": []})),
    )
    .expect(1)
    .mount(&server)
    .await;

  assert!(api.teams().await.unwrap().is_empty());
}

#[tokio::test]
async fn dji_upload_is_multipart_with_token() {
  let server = MockServer::start().await;
  let dir = tempfile::tempdir().unwrap();
  let api = api_for(&server, logged_in_store(&dir));

  Mock::given(method("POST"))
    .and(path("/dji/images"))
    .and(header("authorization", "Bearer test-token"))
    .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
      "id": 31,
      "task_id": 5,
      "file_name": "field-7.jpg",
      "uploaded_at": "2026-08-06T17:00:00Z",
      "url": null,
    })))
    .expect(1)
    .mount(&server)
    .await;

  let image = api
    .upload_dji_image(5, "field-7.jpg", vec![0xFF, 0xD8, 0xFF])
    .await
    .unwrap();
  assert_eq!(image.id, 31);
}

#[tokio::test]
async fn expired_token_surfaces_401() {
  let server = MockServer::start().await;
  let dir = tempfile::tempdir().unwrap();
  let api = api_for(&server, logged_in_store(&dir));

  Mock::given(method("POST"))
    .and(path("/dji/images"))
    .respond_with(
      ResponseTemplate::new(401).set_body_json(serde_json::json!({"message": "Token expired"})),
    )
    .mount(&server)
    .await;

  let err = api
    .upload_dji_image(5, "field-7.jpg", vec![0x00])
    .await
    .unwrap_err();
  assert_eq!(err.status, Some(401));
  assert_eq!(err.message(), "Token expired");
}

#[tokio::test]
async fn application_failure_flag_becomes_error_without_http_status() {
  let server = MockServer::start().await;
  let dir = tempfile::tempdir().unwrap();
  let api = api_for(&server, logged_in_store(&dir));

  Mock::given(method("POST"))
    .and(path("/plan/delete"))
    .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
      "status": "false",
      "message": "Plan already dispatched",
      "data": null,
    })))
    .mount(&server)
    .await;

  let err = api.delete_plan(3).await.unwrap_err();
  assert_eq!(err.status, None);
  assert_eq!(err.message(), "Plan already dispatched");
}

#[tokio::test]
async fn form_endpoints_submit_urlencoded_bodies() {
  let server = MockServer::start().await;
  let dir = tempfile::tempdir().unwrap();
  let api = api_for(&server, logged_in_store(&dir));

  Mock::given(method("POST"))
    .and(path("/farmer/create"))
    .and(header("content-type", "application/x-www-form-urlencoded"))
    .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
      "status": "true",
      "data": {"id": 8, "name": "W. Perera", "nic": "851234567V", "phone": null, "asc_id": null, "address": null},
    })))
    .expect(1)
    .mount(&server)
    .await;

  let farmer = api
    .create_farmer(&dsms::api::farmers::FarmerDraft {
      name: "W. Perera".to_string(),
      nic: "851234567V".to_string(),
      phone: None,
      asc_id: None,
      address: None,
    })
    .await
    .unwrap();
  assert_eq!(farmer.id, 8);
}

#[tokio::test]
async fn node_get_sends_query_parameters() {
  let server = MockServer::start().await;
  let dir = tempfile::tempdir().unwrap();
  let api = api_for(&server, logged_in_store(&dir));

  Mock::given(method("GET"))
    .and(path("/dji/images"))
    .and(wiremock::matchers::query_param("task_id", "5"))
    .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
    .expect(1)
    .mount(&server)
    .await;

  assert!(api.dji_images(5).await.unwrap().is_empty());
}
