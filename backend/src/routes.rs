use std::sync::Arc;
use std::time::Instant;

use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use log::{error, info, warn};
use serde::de::DeserializeOwned;

use crate::config::ServiceConfig;
use crate::error::ChurnError;
use crate::inference::ChurnScorer;
use crate::models::{ApiResponse, CustomerRecord, PredictionResponse, PredictionResult};
use crate::rate_limit::RateLimiter;
use crate::service::PredictionService;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Shared by every worker; read-only apart from atomics and the limiter map.
pub struct AppState {
    pub service: PredictionService,
    limiter: RateLimiter,
    api_keys: Vec<String>,
    max_batch: usize,
}

impl AppState {
    pub fn new(scorer: Arc<dyn ChurnScorer>, config: &ServiceConfig) -> Self {
        Self {
            service: PredictionService::new(scorer),
            limiter: RateLimiter::new(config.rate_limit_per_minute),
            api_keys: config.api_keys.clone(),
            max_batch: config.max_batch,
        }
    }

    /// API key and rate limit checks shared by the prediction routes. Runs
    /// before the body is parsed.
    fn guard(&self, request: &HttpRequest) -> Result<(), ChurnError> {
        if !self.api_keys.is_empty() {
            let provided = request
                .headers()
                .get(API_KEY_HEADER)
                .ok_or(ChurnError::Unauthorized("missing API key"))?;
            let provided = provided.to_str().unwrap_or("");
            if !self.api_keys.iter().any(|key| key == provided) {
                return Err(ChurnError::Unauthorized("invalid API key"));
            }
        }

        self.throttle(request, 1)
    }

    fn throttle(&self, request: &HttpRequest, cost: u32) -> Result<(), ChurnError> {
        if let Some(client_ip) = request.peer_addr().map(|addr| addr.ip().to_string()) {
            if !self.limiter.check(&client_ip, cost) {
                warn!("Rate limit exceeded for IP: {}", client_ip);
                return Err(ChurnError::RateLimited);
            }
        }
        Ok(())
    }

    /// Missing fields and values outside a domain become 400s and count as
    /// failed predictions.
    fn parse_body<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T, ChurnError> {
        serde_json::from_slice(body).map_err(|e| {
            warn!("Rejected request body: {}", e);
            self.service.record_failure();
            ChurnError::InvalidInput(format!("Json deserialize error: {e}"))
        })
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/model_info", web::get().to(model_info))
        .route("/stats", web::get().to(stats))
        .route("/predict_churn", web::post().to(predict_churn))
        .route("/predict_churn/batch", web::post().to(batch_predict))
        .default_service(web::route().to(not_found));
}

/// Caps the raw body size of the prediction routes.
pub fn payload_config(limit: usize) -> web::PayloadConfig {
    web::PayloadConfig::new(limit)
}

fn failure(err: &ChurnError, start_time: Instant) -> HttpResponse {
    let mut body = ApiResponse::<()>::error(&err.to_string()).with_kind(err.kind());
    body.execution_time_ms = Some(start_time.elapsed().as_millis() as u64);
    HttpResponse::build(err.status_code()).json(body)
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success("Customer churn prediction API"))
}

async fn model_info(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(state.service.model_info()))
}

async fn stats(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(state.service.stats()))
}

async fn predict_churn(
    state: web::Data<AppState>,
    body: web::Bytes,
    request: HttpRequest,
) -> HttpResponse {
    let start_time = Instant::now();

    if let Err(e) = state.guard(&request) {
        return failure(&e, start_time);
    }
    let record: CustomerRecord = match state.parse_body(&body) {
        Ok(record) => record,
        Err(e) => return failure(&e, start_time),
    };

    info!("Prediction request received");

    let worker_state = state.clone();

    match web::block(move || worker_state.service.predict(&record)).await {
        Ok(Ok(result)) => {
            info!(
                "Prediction succeeded: probability={}% level={:?}",
                result.probability_pct, result.decision.level
            );
            HttpResponse::Ok().json(result.to_response())
        }
        Ok(Err(e)) => {
            if matches!(e, ChurnError::InvalidInput(_)) {
                warn!("Validation failed: {}", e);
            } else {
                error!("Prediction error: {}", e);
            }
            failure(&e, start_time)
        }
        Err(e) => {
            error!("Blocking execution error: {}", e);
            state.service.record_failure();
            failure(&ChurnError::Execution(e.to_string()), start_time)
        }
    }
}

async fn batch_predict(
    state: web::Data<AppState>,
    body: web::Bytes,
    request: HttpRequest,
) -> HttpResponse {
    let start_time = Instant::now();

    if let Err(e) = state.guard(&request) {
        return failure(&e, start_time);
    }
    let records: Vec<CustomerRecord> = match state.parse_body(&body) {
        Ok(records) => records,
        Err(e) => return failure(&e, start_time),
    };

    if records.len() > state.max_batch {
        state.service.record_failure();
        let e = ChurnError::InvalidInput(format!(
            "batch of {} customers exceeds the limit of {}",
            records.len(),
            state.max_batch
        ));
        return failure(&e, start_time);
    }

    // The guard already charged one unit; every further record costs one more.
    let extra = u32::try_from(records.len().saturating_sub(1)).unwrap_or(u32::MAX);
    if extra > 0 {
        if let Err(e) = state.throttle(&request, extra) {
            return failure(&e, start_time);
        }
    }

    info!("Batch prediction request received: {} customers", records.len());

    let worker_state = state.clone();
    match web::block(move || worker_state.service.predict_batch(&records)).await {
        Ok(Ok(results)) => {
            info!("Batch prediction succeeded: {} results", results.len());
            let body: Vec<PredictionResponse> =
                results.iter().map(PredictionResult::to_response).collect();
            let mut response = ApiResponse::success(body);
            response.execution_time_ms = Some(start_time.elapsed().as_millis() as u64);
            HttpResponse::Ok().json(response)
        }
        Ok(Err(e)) => {
            error!("Batch prediction error: {}", e);
            failure(&e, start_time)
        }
        Err(e) => {
            error!("Blocking execution error (batch): {}", e);
            state.service.record_failure();
            failure(&ChurnError::Execution(e.to_string()), start_time)
        }
    }
}

async fn not_found() -> HttpResponse {
    failure(&ChurnError::NotFound, Instant::now())
}
