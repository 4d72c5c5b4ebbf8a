use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use provider_anomaly::scoring::{
    scoring_router, AnomalyPipeline, IsolationForestModel, ReferenceDataset,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const REFERENCE_CSV: &[u8] = include_bytes!("fixtures/reference_claims.csv");
const FOREST_JSON: &[u8] = include_bytes!("fixtures/isolation_forest.json");

fn router() -> axum::Router {
    let registry = ReferenceDataset::from_reader(REFERENCE_CSV)
        .expect("reference dataset parses")
        .registry();
    let model = IsolationForestModel::from_reader(FOREST_JSON).expect("forest loads");
    let pipeline =
        AnomalyPipeline::new(Arc::new(registry), Arc::new(model), true).expect("pipeline builds");
    scoring_router(Arc::new(pipeline))
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = router().oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let body = serde_json::from_slice(&bytes).expect("json body");
    (status, body)
}

fn score_request(payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/providers/score")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn score_endpoint_returns_verdict_and_named_features() {
    let (status, body) = send(score_request(json!({
        "provider": "Northside Health",
        "procedure": "MRI Scan",
        "avg_covered_charges": 50000.0,
        "avg_total_payments": 250000.0,
        "total_discharge": 100
    })))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verdict"]["is_anomalous"], json!(true));
    assert_eq!(body["verdict"]["classification"], json!("anomalous"));
    assert_eq!(body["features"][0]["name"], json!("procedure_code"));
    assert_eq!(body["features"][0]["value"], json!(1.0));
    assert_eq!(body["features"][1]["value"], json!(3.0));
    assert!(body["display_score"]
        .as_str()
        .expect("display score")
        .starts_with("-0."));
}

#[tokio::test]
async fn unknown_provider_is_unprocessable_with_known_labels() {
    let (status, body) = send(score_request(json!({
        "provider": "Unlisted Provider",
        "procedure": "MRI Scan",
        "avg_covered_charges": 50000.0,
        "avg_total_payments": 20000.0,
        "total_discharge": 100
    })))
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["dimension"], json!("provider"));
    assert_eq!(body["label"], json!("Unlisted Provider"));
    assert_eq!(
        body["known_labels"],
        json!([
            "General Hospital",
            "Lakeside Clinic",
            "Mercy Medical",
            "Northside Health"
        ])
    );
}

#[tokio::test]
async fn negative_discharge_is_rejected() {
    let (status, body) = send(score_request(json!({
        "provider": "Northside Health",
        "procedure": "MRI Scan",
        "avg_covered_charges": 50000.0,
        "avg_total_payments": 20000.0,
        "total_discharge": -4
    })))
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], json!("total_discharge"));
}

#[tokio::test]
async fn non_numeric_charges_are_reported_as_invalid_numeric_input() {
    let (status, body) = send(score_request(json!({
        "provider": "Northside Health",
        "procedure": "MRI Scan",
        "avg_covered_charges": "abc",
        "avg_total_payments": 20000.0,
        "total_discharge": 100
    })))
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], json!("avg_covered_charges"));
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("abc"));
}

#[tokio::test]
async fn integral_float_discharge_and_numeric_strings_are_accepted() {
    let (status, body) = send(score_request(json!({
        "provider": "Northside Health",
        "procedure": "MRI Scan",
        "avg_covered_charges": "50000",
        "avg_total_payments": 20000.0,
        "total_discharge": 100.0
    })))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verdict"]["is_anomalous"], json!(false));
    assert_eq!(body["features"][2]["name"], json!("total_discharge"));
    assert_eq!(body["features"][2]["value"], json!(100.0));
    assert_eq!(body["features"][3]["value"], json!(50000.0));
}

#[tokio::test]
async fn fractional_discharge_is_rejected() {
    let (status, body) = send(score_request(json!({
        "provider": "Northside Health",
        "procedure": "MRI Scan",
        "avg_covered_charges": 50000.0,
        "avg_total_payments": 20000.0,
        "total_discharge": 100.5
    })))
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], json!("total_discharge"));
}

#[tokio::test]
async fn malformed_body_gets_a_json_error() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/providers/score")
        .header("content-type", "application/json")
        .body(Body::from("{\"provider\": "))
        .expect("request builds");
    let (status, body) = send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(score_request(json!({ "provider": "Northside Health" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn categories_endpoint_lists_labels_in_code_order() {
    let request = Request::builder()
        .uri("/api/v1/categories/procedure")
        .body(Body::empty())
        .expect("request builds");
    let (status, body) = send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dimension"], json!("procedure"));
    assert_eq!(
        body["labels"],
        json!([
            { "code": 0, "label": "Echocardiogram" },
            { "code": 1, "label": "MRI Scan" }
        ])
    );
}

#[tokio::test]
async fn categories_endpoint_rejects_unknown_dimension() {
    let request = Request::builder()
        .uri("/api/v1/categories/diagnosis")
        .body(Body::empty())
        .expect("request builds");
    let (status, _) = send(request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
