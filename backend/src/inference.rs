use std::path::Path;

use serde::Serialize;
use tract_onnx::prelude::*;

use crate::action::{CRITICAL_RISK_THRESHOLD, HIGH_RISK_THRESHOLD};
use crate::config::{ModelConfig, OutputKind};
use crate::error::{ChurnError, Result};
use crate::features::FeatureEncoder;
use crate::models::CustomerRecord;

type OnnxPlan = TypedRunnableModel<TypedModel>;

/// Anything that can turn a customer record into a churn probability.
///
/// Implementations must be deterministic for a given model version and
/// return a value in `[0, 1]`.
pub trait ChurnScorer: Send + Sync {
    fn score(&self, record: &CustomerRecord) -> Result<f64>;

    fn version(&self) -> &str;

    fn feature_names(&self) -> &[String] {
        &[]
    }
}

/// Scorer backed by an ONNX graph taking a `[1, N]` float row.
pub struct OnnxChurnScorer {
    model: OnnxPlan,
    encoder: FeatureEncoder,
    version: String,
    output_kind: OutputKind,
}

impl OnnxChurnScorer {
    /// Loads the feature list then the model. Either one missing is fatal.
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let encoder = FeatureEncoder::load(&config.feature_names_path)?;
        let model = load_plan(&config.model_path, encoder.len())?;

        Ok(Self {
            model,
            encoder,
            version: config.version.clone(),
            output_kind: config.output_kind,
        })
    }

    fn run(&self, features: &[f32]) -> TractResult<Vec<f32>> {
        let input_tensor = Tensor::from_shape(&[1, features.len()], features)?;
        let outputs = self.model.run(tvec!(input_tensor.into()))?;

        // Classifier exports put the label tensor first; take the first float output.
        let scores = outputs
            .iter()
            .find(|output| output.datum_type() == f32::datum_type())
            .ok_or_else(|| anyhow::anyhow!("model produced no f32 output"))?;

        Ok(scores.to_array_view::<f32>()?.iter().copied().collect())
    }
}

fn load_plan(path: &Path, width: usize) -> Result<OnnxPlan> {
    if !path.exists() {
        return Err(ChurnError::MissingArtifact {
            path: path.to_path_buf(),
        });
    }

    tract_onnx::onnx()
        .model_for_path(path)
        .and_then(|model| {
            model.with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), tvec!(1, width)))
        })
        .and_then(|model| model.into_optimized())
        .and_then(|model| model.into_runnable())
        .map_err(|e| ChurnError::ModelLoad {
            path: path.to_path_buf(),
            message: format!("{e:#}"),
        })
}

impl ChurnScorer for OnnxChurnScorer {
    fn score(&self, record: &CustomerRecord) -> Result<f64> {
        let features = self.encoder.encode(record);
        let values = self
            .run(&features)
            .map_err(|e| ChurnError::Scoring(format!("{e:#}")))?;

        probability_from_output(&values, self.output_kind)
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn feature_names(&self) -> &[String] {
        self.encoder.names()
    }
}

/// Reads the positive-class probability out of one output row.
pub fn probability_from_output(values: &[f32], kind: OutputKind) -> Result<f64> {
    match (values, kind) {
        ([_, positive], _) => Ok(f64::from(*positive)),
        ([value], OutputKind::Probability) => Ok(f64::from(*value)),
        ([logit], OutputKind::Logit) => Ok(1.0 / (1.0 + (-f64::from(*logit)).exp())),
        _ => Err(ChurnError::Scoring(format!(
            "expected 1 or 2 output values per row, got {}",
            values.len()
        ))),
    }
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub input_shape: Vec<usize>,
    pub version: String,
    pub features: Vec<String>,
    pub critical_threshold: f64,
    pub high_risk_threshold: f64,
}

impl ModelInfo {
    pub fn from_scorer(scorer: &dyn ChurnScorer) -> Self {
        let features = scorer.feature_names().to_vec();
        ModelInfo {
            input_shape: vec![1, features.len()],
            version: scorer.version().to_string(),
            features,
            critical_threshold: CRITICAL_RISK_THRESHOLD,
            high_risk_threshold: HIGH_RISK_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn model_config(dir: &Path) -> ModelConfig {
        ModelConfig {
            model_path: dir.join("churn_predictor_pipeline.onnx"),
            feature_names_path: dir.join("feature_names.json"),
            version: "test".to_string(),
            output_kind: OutputKind::Probability,
        }
    }

    #[test]
    fn startup_fails_without_feature_names() {
        let dir = tempfile::tempdir().unwrap();
        let err = OnnxChurnScorer::load(&model_config(dir.path())).err().unwrap();
        match err {
            ChurnError::MissingArtifact { path } => {
                assert_eq!(path, dir.path().join("feature_names.json"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn startup_fails_without_model() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("feature_names.json"), r#"["tenure"]"#).unwrap();
        let err = OnnxChurnScorer::load(&model_config(dir.path())).err().unwrap();
        match err {
            ChurnError::MissingArtifact { path } => {
                assert_eq!(path, dir.path().join("churn_predictor_pipeline.onnx"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn startup_fails_on_corrupt_model() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("feature_names.json"), r#"["tenure"]"#).unwrap();
        std::fs::write(dir.path().join("churn_predictor_pipeline.onnx"), b"not onnx").unwrap();
        let err = OnnxChurnScorer::load(&model_config(dir.path())).err().unwrap();
        assert!(matches!(err, ChurnError::ModelLoad { path, .. } if path.ends_with(PathBuf::from("churn_predictor_pipeline.onnx"))));
    }

    #[test]
    fn reads_probability_outputs() {
        let kind = OutputKind::Probability;
        assert_eq!(probability_from_output(&[0.25, 0.75], kind).unwrap(), 0.75);
        assert_eq!(probability_from_output(&[0.5], kind).unwrap(), 0.5);
        assert!(probability_from_output(&[], kind).is_err());
        assert!(probability_from_output(&[0.1, 0.2, 0.7], kind).is_err());
    }

    #[test]
    fn logit_output_goes_through_sigmoid() {
        let p = probability_from_output(&[0.0], OutputKind::Logit).unwrap();
        assert!((p - 0.5).abs() < 1e-12);
        let high = probability_from_output(&[4.0], OutputKind::Logit).unwrap();
        assert!(high > 0.98 && high < 1.0);
    }
}
