//! REST layer tests through the real axum router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::util::ServiceExt;

use samarth::data::DatasetMeta;
use samarth::{
    create_rest_router, AnalyticsEngine, Config, DataManager, DatasetSnapshot, ProductionRecord,
    RainfallRecord,
};

fn sample_snapshot() -> DatasetSnapshot {
    let mut records = Vec::new();
    let mut rain = Vec::new();
    for (i, year) in (2019..=2023).enumerate() {
        let i = i as f64;
        for (state, district, factor) in
            [("Punjab", "Ludhiana", 3.0), ("Haryana", "Karnal", 1.0)]
        {
            records.push(ProductionRecord {
                state: state.to_string(),
                district: district.to_string(),
                crop: "Rice".to_string(),
                year,
                production_tonnes: 1000.0 * factor + 50.0 * i,
            });
            records.push(ProductionRecord {
                state: state.to_string(),
                district: district.to_string(),
                crop: "Wheat".to_string(),
                year,
                production_tonnes: 800.0 * factor,
            });
        }
        rain.push(RainfallRecord {
            state: "Punjab".to_string(),
            year,
            annual_rainfall_mm: 620.0,
        });
        rain.push(RainfallRecord {
            state: "Haryana".to_string(),
            year,
            annual_rainfall_mm: 510.0,
        });
    }
    DatasetSnapshot::build(
        records,
        rain,
        DatasetMeta::new("agriculture", "https://data.gov.in", "agri-1"),
        DatasetMeta::new("rainfall", "https://data.gov.in", "rain-1"),
    )
}

fn router() -> axum::Router {
    let config = Config::default();
    let data = Arc::new(DataManager::from_snapshot(&config, sample_snapshot()));
    let engine = Arc::new(AnalyticsEngine::new(data, config.analytics.clone()));
    create_rest_router(engine, &config.server)
}

async fn post_ask(router: axum::Router, question: &str) -> (StatusCode, serde_json::Value) {
    let body = serde_json::json!({ "question": question }).to_string();
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ask")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap();
    (status, value)
}

#[tokio::test]
async fn test_ask_compare_round_trip() {
    let (status, body) = post_ask(
        router(),
        "Which state had better rice production, Punjab or Haryana, in the last 5 years?",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let tables = body["tables"].as_array().unwrap();
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0]["title"], "Punjab");
    assert_eq!(tables[1]["title"], "Haryana");
    for table in tables {
        let rows = table["rows"].as_array().unwrap();
        assert!(rows.len() <= 3);
        for row in rows {
            assert_eq!(row[0], "Rice");
        }
    }
    for citation in body["citations"].as_array().unwrap() {
        let year = citation["year"].as_i64().unwrap();
        assert!((2019..=2023).contains(&year));
    }
}

#[tokio::test]
async fn test_ask_missing_slots_is_422() {
    let (status, body) = post_ask(
        router(),
        "Which district had the highest and lowest yields?",
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "missing_parameters");
    assert_eq!(body["error"], "Missing states or crop in the question.");
}

#[tokio::test]
async fn test_ask_unknown_entity_is_400() {
    let (status, body) = post_ask(
        router(),
        "Compare rainfall in Karnataka and Maharashtra over the last 5 years",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "domain_error");
    assert!(body["error"].as_str().unwrap().contains("Karnataka"));
}

#[tokio::test]
async fn test_ask_unknown_intent_falls_back() {
    let (status, body) = post_ask(router(), "What is the meaning of life?").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tables"].as_array().unwrap().len(), 0);
    assert_eq!(body["citations"].as_array().unwrap().len(), 0);
    assert_eq!(body["debug"]["intent"], "unknown");
}

#[tokio::test]
async fn test_health_probe() {
    let response = router()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["status"], "ok");
}

#[tokio::test]
async fn test_refresh_reloads_bundled_samples() {
    // DataManager falls back to the configured local samples, which are
    // bundled with the repo, so a refresh succeeds from the test cwd.
    let response = router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/refresh")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["status"], "reloaded");
}

#[tokio::test]
async fn test_metrics_exposition() {
    let response = router()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("samarth_questions_total"));
}
