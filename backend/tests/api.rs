use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};

use churn_backend::config::ServiceConfig;
use churn_backend::inference::ChurnScorer;
use churn_backend::models::{CustomerRecord, PredictionResponse};
use churn_backend::routes::{self, AppState, API_KEY_HEADER};
use churn_backend::{ChurnError, Result};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Scores by tenure so one app can exercise every branch of the table.
struct TenureScorer;

impl ChurnScorer for TenureScorer {
    fn score(&self, record: &CustomerRecord) -> Result<f64> {
        Ok(match record.tenure {
            1 => 0.75,
            3 | 24 => 0.55,
            999 => 1.5,
            _ => 0.10,
        })
    }

    fn version(&self) -> &str {
        "tenure-fake"
    }

    fn feature_names(&self) -> &[String] {
        &[]
    }
}

struct BrokenScorer;

impl ChurnScorer for BrokenScorer {
    fn score(&self, _record: &CustomerRecord) -> Result<f64> {
        Err(ChurnError::Scoring("graph execution failed".into()))
    }

    fn version(&self) -> &str {
        "broken"
    }
}

fn customer(tenure: u32, contract: &str) -> Value {
    let mut body = serde_json::to_value(CustomerRecord::demo()).unwrap();
    body["tenure"] = json!(tenure);
    body["Contract"] = json!(contract);
    body
}

macro_rules! app {
    ($scorer:expr, $config:expr) => {{
        let config: ServiceConfig = $config;
        let state = web::Data::new(AppState::new(Arc::new($scorer), &config));
        test::init_service(
            App::new()
                .app_data(state)
                .app_data(routes::payload_config(config.max_body_bytes))
                .configure(routes::configure),
        )
        .await
    }};
}

// ---------------------------------------------------------------------------
// Prediction scenarios
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn scenarios_cover_every_action() {
    let app = app!(TenureScorer, ServiceConfig::default());

    let cases = [
        (1, "Month-to-month", "75.0%", true, "**CRITICAL RISK:**"),
        (24, "Two year", "55.0%", true, "**HIGH RISK:** Send a targeted email"),
        (3, "Month-to-month", "55.0%", true, "**HIGH RISK:** Offer a 3-month discount"),
        (40, "One year", "10.0%", false, "Monitor usage."),
    ];

    for (tenure, contract, probability, high_risk, action_prefix) in cases {
        let req = test::TestRequest::post()
            .uri("/predict_churn")
            .set_json(customer(tenure, contract))
            .to_request();
        let resp: PredictionResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.churn_probability, probability, "tenure {tenure}");
        assert_eq!(resp.is_high_risk, high_risk, "tenure {tenure}");
        assert!(
            resp.recommended_action.starts_with(action_prefix),
            "tenure {tenure}: {}",
            resp.recommended_action
        );
        assert_eq!(resp.model_output, "Prediction generated successfully.");
    }
}

#[actix_web::test]
async fn out_of_domain_category_is_a_client_error() {
    let app = app!(TenureScorer, ServiceConfig::default());

    let req = test::TestRequest::post()
        .uri("/predict_churn")
        .set_json(customer(1, "Quarterly"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["kind"], "client_error");
}

#[actix_web::test]
async fn missing_field_is_a_client_error() {
    let app = app!(TenureScorer, ServiceConfig::default());

    let mut body = customer(1, "Month-to-month");
    body.as_object_mut().unwrap().remove("TotalCharges");
    let req = test::TestRequest::post()
        .uri("/predict_churn")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn scorer_failures_are_server_errors_with_diagnostics() {
    let app = app!(BrokenScorer, ServiceConfig::default());

    let req = test::TestRequest::post()
        .uri("/predict_churn")
        .set_json(customer(1, "Month-to-month"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["kind"], "server_error");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("graph execution failed"));
}

#[actix_web::test]
async fn out_of_range_probability_is_a_server_error() {
    let app = app!(TenureScorer, ServiceConfig::default());

    let req = test::TestRequest::post()
        .uri("/predict_churn")
        .set_json(customer(999, "Month-to-month"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// ---------------------------------------------------------------------------
// Batch and auxiliary endpoints
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn batch_returns_results_in_order() {
    let app = app!(TenureScorer, ServiceConfig::default());

    let req = test::TestRequest::post()
        .uri("/predict_churn/batch")
        .set_json(json!([customer(1, "Month-to-month"), customer(40, "Two year")]))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["success"], true);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["churn_probability"], "75.0%");
    assert_eq!(data[1]["is_high_risk"], false);
}

#[actix_web::test]
async fn empty_or_oversized_batch_is_rejected() {
    let config = ServiceConfig {
        max_batch: 1,
        ..ServiceConfig::default()
    };
    let app = app!(TenureScorer, config);

    let empty = test::TestRequest::post()
        .uri("/predict_churn/batch")
        .set_json(json!([]))
        .to_request();
    assert_eq!(
        test::call_service(&app, empty).await.status(),
        StatusCode::BAD_REQUEST
    );

    let oversized = test::TestRequest::post()
        .uri("/predict_churn/batch")
        .set_json(json!([customer(1, "Two year"), customer(2, "Two year")]))
        .to_request();
    assert_eq!(
        test::call_service(&app, oversized).await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[actix_web::test]
async fn stats_and_model_info_reflect_the_scorer() {
    let app = app!(TenureScorer, ServiceConfig::default());

    let req = test::TestRequest::post()
        .uri("/predict_churn")
        .set_json(customer(1, "Month-to-month"))
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let stats: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/stats").to_request(),
    )
    .await;
    assert_eq!(stats["data"]["total_predictions"], 1);
    assert_eq!(stats["data"]["critical_predictions"], 1);

    let info: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/model_info").to_request(),
    )
    .await;
    assert_eq!(info["data"]["version"], "tenure-fake");
    assert_eq!(info["data"]["critical_threshold"], 70.0);
}

#[actix_web::test]
async fn unknown_route_is_not_found() {
    let app = app!(TenureScorer, ServiceConfig::default());
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/nope").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn api_key_is_enforced_when_configured() {
    let config = ServiceConfig {
        api_keys: vec!["secret".to_string()],
        ..ServiceConfig::default()
    };
    let app = app!(TenureScorer, config);

    let missing = test::TestRequest::post()
        .uri("/predict_churn")
        .set_json(customer(1, "Month-to-month"))
        .to_request();
    assert_eq!(
        test::call_service(&app, missing).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let wrong = test::TestRequest::post()
        .uri("/predict_churn")
        .insert_header((API_KEY_HEADER, "guess"))
        .set_json(customer(1, "Month-to-month"))
        .to_request();
    assert_eq!(
        test::call_service(&app, wrong).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let ok = test::TestRequest::post()
        .uri("/predict_churn")
        .insert_header((API_KEY_HEADER, "secret"))
        .set_json(customer(1, "Month-to-month"))
        .to_request();
    assert_eq!(test::call_service(&app, ok).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn rate_limit_applies_per_client_ip() {
    let config = ServiceConfig {
        rate_limit_per_minute: 2,
        ..ServiceConfig::default()
    };
    let app = app!(TenureScorer, config);
    let peer = "10.1.2.3:5555".parse().unwrap();

    let mut statuses = Vec::new();
    for _ in 0..3 {
        let req = test::TestRequest::post()
            .uri("/predict_churn")
            .peer_addr(peer)
            .set_json(customer(40, "One year"))
            .to_request();
        statuses.push(test::call_service(&app, req).await.status());
    }

    assert_eq!(
        statuses,
        vec![StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
    );
}

#[actix_web::test]
async fn api_key_is_checked_before_the_body_is_read() {
    let config = ServiceConfig {
        api_keys: vec!["secret".to_string()],
        max_batch: 1,
        ..ServiceConfig::default()
    };
    let app = app!(TenureScorer, config);

    let bad_body = test::TestRequest::post()
        .uri("/predict_churn")
        .set_json(json!({"Contract": "Quarterly"}))
        .to_request();
    let resp = test::call_service(&app, bad_body).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert!(!body["error"].as_str().unwrap().contains("Quarterly"));

    let oversized_batch = test::TestRequest::post()
        .uri("/predict_churn/batch")
        .set_json(json!([customer(1, "Two year"), customer(2, "Two year")]))
        .to_request();
    assert_eq!(
        test::call_service(&app, oversized_batch).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let not_json = test::TestRequest::post()
        .uri("/predict_churn/batch")
        .insert_header(("content-type", "application/json"))
        .set_payload("not json")
        .to_request();
    assert_eq!(
        test::call_service(&app, not_json).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn malformed_bodies_count_against_the_rate_limit() {
    let config = ServiceConfig {
        rate_limit_per_minute: 2,
        ..ServiceConfig::default()
    };
    let app = app!(TenureScorer, config);
    let peer = "10.9.8.7:4444".parse().unwrap();

    let mut statuses = Vec::new();
    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/predict_churn")
            .peer_addr(peer)
            .set_json(customer(1, "Quarterly"))
            .to_request();
        statuses.push(test::call_service(&app, req).await.status());
    }
    let valid = test::TestRequest::post()
        .uri("/predict_churn")
        .peer_addr(peer)
        .set_json(customer(40, "One year"))
        .to_request();
    statuses.push(test::call_service(&app, valid).await.status());

    assert_eq!(
        statuses,
        vec![
            StatusCode::BAD_REQUEST,
            StatusCode::BAD_REQUEST,
            StatusCode::TOO_MANY_REQUESTS
        ]
    );
}

#[actix_web::test]
async fn rejected_bodies_are_counted_as_failures() {
    let app = app!(TenureScorer, ServiceConfig::default());

    let mut missing = customer(1, "Month-to-month");
    missing.as_object_mut().unwrap().remove("Gender");
    for body in [customer(1, "Quarterly"), missing, json!([customer(1, "Two year")])] {
        let req = test::TestRequest::post()
            .uri("/predict_churn")
            .set_json(body)
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );
    }

    let stats: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/stats").to_request(),
    )
    .await;
    assert_eq!(stats["data"]["failed_predictions"], 3);
    assert_eq!(stats["data"]["total_predictions"], 0);
}

#[actix_web::test]
async fn batch_with_a_failing_record_records_no_predictions() {
    let app = app!(TenureScorer, ServiceConfig::default());

    let req = test::TestRequest::post()
        .uri("/predict_churn/batch")
        .set_json(json!([customer(1, "Month-to-month"), customer(999, "Month-to-month")]))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );

    let stats: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/stats").to_request(),
    )
    .await;
    assert_eq!(stats["data"]["total_predictions"], 0);
    assert_eq!(stats["data"]["critical_predictions"], 0);
    assert_eq!(stats["data"]["failed_predictions"], 1);
}
