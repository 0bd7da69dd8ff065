use serde::{Deserialize, Serialize};

pub const MODEL_OUTPUT_OK: &str = "Prediction generated successfully.";

/// Body of a successful `/predict_churn` call.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionResponse {
    pub churn_probability: String,
    pub is_high_risk: bool,
    pub recommended_action: String,
    pub model_output: String,
}

/// Renders `75.0%`, `55.43%`: at least one decimal digit, no padding.
pub fn format_percentage(pct: f64) -> String {
    let mut text = pct.to_string();
    if pct.is_finite() && !text.contains('.') {
        text.push_str(".0");
    }
    text.push('%');
    text
}
