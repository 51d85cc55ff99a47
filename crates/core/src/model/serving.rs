use crate::model::{FeatureMatrix, ModelBackend};
use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Inference over HTTP against a model server exposing
/// `POST {base}/v1/models/{name}:predict`.
#[derive(Debug, Clone)]
pub struct ServingBackend {
    http: reqwest::Client,
    url: String,
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: [&'a FeatureMatrix; 1],
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<f32>>,
}

impl ServingBackend {
    pub fn new(http: reqwest::Client, base_url: &str, model_name: &str) -> Self {
        let url = format!(
            "{}/v1/models/{}:predict",
            base_url.trim_end_matches('/'),
            model_name
        );
        Self { http, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl ModelBackend for ServingBackend {
    async fn infer(&self, input: &FeatureMatrix) -> anyhow::Result<Vec<f32>> {
        let res = self
            .http
            .post(&self.url)
            .json(&PredictRequest { instances: [input] })
            .send()
            .await
            .context("model serving request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read model serving response")?;
        if !status.is_success() {
            anyhow::bail!("model serving HTTP {status}: {text}");
        }

        parse_predictions(&text)
    }
}

fn parse_predictions(text: &str) -> anyhow::Result<Vec<f32>> {
    let parsed = serde_json::from_str::<PredictResponse>(text)
        .with_context(|| format!("model serving response is not valid JSON: {text}"))?;
    parsed
        .predictions
        .into_iter()
        .next()
        .context("model serving response has no prediction rows")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_predict_url() {
        let backend = ServingBackend::new(reqwest::Client::new(), "http://models:8501/", "AAPL");
        assert_eq!(backend.url(), "http://models:8501/v1/models/AAPL:predict");
    }

    #[test]
    fn takes_first_prediction_row() {
        let body = json!({"predictions": [[0.1, 0.2, 0.3], [0.9]]}).to_string();
        assert_eq!(parse_predictions(&body).unwrap(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn rejects_empty_or_malformed_responses() {
        assert!(parse_predictions(&json!({"predictions": []}).to_string()).is_err());
        assert!(parse_predictions("not json").is_err());
        assert!(parse_predictions(&json!({"outputs": [[0.1]]}).to_string()).is_err());
    }

    #[test]
    fn request_wraps_matrix_in_instances() {
        let matrix = FeatureMatrix(vec![[0.0; crate::model::features::NUM_FEATURES]]);
        let v = serde_json::to_value(PredictRequest {
            instances: [&matrix],
        })
        .unwrap();
        assert_eq!(v["instances"].as_array().map(|a| a.len()), Some(1));
        assert_eq!(v["instances"][0].as_array().map(|a| a.len()), Some(1));
    }
}
