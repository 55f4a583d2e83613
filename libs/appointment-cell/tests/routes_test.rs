use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use appointment_cell::router::appointment_routes;
use shared_utils::test_utils::{TestClinic, TestUser};

fn form_json(name: &str) -> Value {
    json!({
        "name": name,
        "dob_day": 12,
        "dob_month": 4,
        "dob_year": 1985,
        "doctor": "Dr. Smith",
        "location": "Main Street Clinic",
        "email": "jane@example.com",
        "insurance_carrier": "Cigna"
    })
}

async fn post(app: &Router, token: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: &Router, token: &str, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn drafts_require_a_token() {
    let clinic = TestClinic::new();
    let app = appointment_routes(clinic.config_arc());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/drafts")
                .header("content-type", "application/json")
                .body(Body::from(form_json("Jane Doe").to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn full_booking_flow_over_http() {
    let clinic = TestClinic::new();
    let token = clinic.token(&TestUser::default());
    let app = appointment_routes(clinic.config_arc());

    let (status, draft) = post(&app, &token, "/drafts", form_json("Jane Doe")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(draft["state"], "collecting");

    let (status, draft) = post(&app, &token, "/drafts/classify", draft).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["state"], "classified");
    assert_eq!(draft["classification"]["patient_type"], "Returning");

    let (status, draft) = post(
        &app,
        &token,
        "/drafts/select-slot",
        json!({ "draft": draft, "date": "2024-05-01", "time": "10:00" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["state"], "slot_chosen");

    let (status, draft) = post(&app, &token, "/drafts/confirm", draft).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["state"], "confirmed");
    assert_eq!(draft["booking"]["Duration (min)"], 30);

    let response = get(&app, &token, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let listing: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["appointments"][0]["Patient Name"], "Jane Doe");
}

#[tokio::test]
async fn invalid_dob_is_bad_request() {
    let clinic = TestClinic::new();
    let token = clinic.token(&TestUser::default());
    let app = appointment_routes(clinic.config_arc());

    let mut form = form_json("Jane Doe");
    form["dob_day"] = json!(30);
    form["dob_month"] = json!(2);
    let (_, draft) = post(&app, &token, "/drafts", form).await;

    let (status, body) = post(&app, &token, "/drafts/classify", draft).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("date of birth"));
}

#[tokio::test]
async fn booked_slot_selection_is_not_found_and_stale_confirm_conflicts() {
    let clinic = TestClinic::new();
    let token = clinic.token(&TestUser::default());
    let app = appointment_routes(clinic.config_arc());

    let (_, draft) = post(&app, &token, "/drafts", form_json("Jane Doe")).await;
    let (_, classified) = post(&app, &token, "/drafts/classify", draft).await;

    let (status, _) = post(
        &app,
        &token,
        "/drafts/select-slot",
        json!({ "draft": classified.clone(), "date": "2024-05-01", "time": "11:00" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Two operators hold drafts for the same slot; the second confirm loses.
    let (_, chosen) = post(
        &app,
        &token,
        "/drafts/select-slot",
        json!({ "draft": classified, "date": "2024-05-01", "time": "09:00" }),
    )
    .await;
    let (status, _) = post(&app, &token, "/drafts/confirm", chosen.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let mut rival = chosen;
    rival["draft_id"] = json!("00000000-0000-4000-8000-000000000000");
    let (status, body) = post(&app, &token, "/drafts/confirm", rival).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn edited_draft_is_rejected_at_confirm() {
    let clinic = TestClinic::new();
    let token = clinic.token(&TestUser::default());
    let app = appointment_routes(clinic.config_arc());

    let (_, draft) = post(&app, &token, "/drafts", form_json("Jane Doe")).await;
    let (_, classified) = post(&app, &token, "/drafts/classify", draft).await;
    let (_, chosen) = post(
        &app,
        &token,
        "/drafts/select-slot",
        json!({ "draft": classified, "date": "2024-05-01", "time": "10:00" }),
    )
    .await;
    assert_eq!(chosen["state"], "slot_chosen");

    let mut renamed = chosen.clone();
    renamed["patient"]["name"] = json!("Mallory");
    renamed["patient"]["location"] = json!("");
    let (status, body) = post(&app, &token, "/drafts/confirm", renamed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("classify it again"));

    let mut other_doctor = chosen;
    other_doctor["slot"]["doctor"] = json!("Dr. Jones");
    let (status, _) = post(&app, &token, "/drafts/confirm", other_doctor).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(clinic.read_appointments().is_none());
    assert!(clinic
        .read_schedule()
        .lines()
        .all(|line| !line.ends_with("2024-05-01,10:00,Booked")));
}

#[tokio::test]
async fn export_is_a_csv_attachment() {
    let clinic = TestClinic::new();
    let token = clinic.token(&TestUser::default());
    let app = appointment_routes(clinic.config_arc());

    let response = get(&app, &token, "/export.csv").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"upcoming_appointments.csv\""
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8(bytes.to_vec()).unwrap().starts_with("Patient Name,DOB"));
}

#[tokio::test]
async fn consistency_route_reports_fixture_bookings() {
    let clinic = TestClinic::new();
    let token = clinic.token(&TestUser::default());
    let app = appointment_routes(clinic.config_arc());

    let response = get(&app, &token, "/consistency").await;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let report: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(report["is_consistent"], false);
    assert_eq!(report["booked_without_record"].as_array().unwrap().len(), 2);
}
