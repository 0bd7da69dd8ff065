use serde::{Deserialize, Serialize};

use crate::action::ActionDecision;

pub use churn_common::{
    format_percentage, Column, ColumnValue, Contract, CustomerRecord, Gender, InternetAddon,
    InternetService, MultipleLines, PaymentMethod, PredictionResponse, YesNo, MODEL_OUTPUT_OK,
};

/// Scored customer, before formatting for the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    /// Churn probability on the percentage scale, rounded to two decimals.
    pub probability_pct: f64,
    pub decision: ActionDecision,
    pub model_version: String,
}

impl PredictionResult {
    pub fn to_response(&self) -> PredictionResponse {
        PredictionResponse {
            churn_probability: format_percentage(self.probability_pct),
            is_high_risk: self.decision.is_high_risk(),
            recommended_action: self.decision.action_text().to_string(),
            model_output: MODEL_OUTPUT_OK.to_string(),
        }
    }
}

/// Scales a [0,1] probability to a percentage rounded to two decimals.
pub fn to_percentage(probability: f64) -> f64 {
    (probability * 100.0 * 100.0).round() / 100.0
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kind: Option<String>,
    pub timestamp: String,
    pub execution_time_ms: Option<u64>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
            kind: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            execution_time_ms: None,
        }
    }

    pub fn error(message: &str) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.to_string()),
            kind: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            execution_time_ms: None,
        }
    }

    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = Some(kind.to_string());
        self
    }
}
