//! Expression measurement — fetches a multimodal emotion report for a video.
//!
//! `HumeExpressionClient` drives the batch job API: submit the media URL with
//! the `face` and `prosody` models, poll until the job finishes, then flatten
//! the predictions into a `MultimodalEmotionReport`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::mood::error::AnalysisError;
use crate::mood::extractor::{EmotionScore, MultimodalEmotionReport};

pub const DEFAULT_HUME_API_URL: &str = "https://api.hume.ai";

#[async_trait]
pub trait ExpressionMeasurer: Send + Sync {
    async fn measure(&self, media_url: &str) -> Result<MultimodalEmotionReport, AnalysisError>;
}

#[derive(Debug, Clone)]
pub struct HumeSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub poll_interval: Duration,
    pub max_polls: u32,
    pub timeout: Duration,
}

impl Default for HumeSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_HUME_API_URL.to_string(),
            poll_interval: Duration::from_secs(2),
            max_polls: 60,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JobCreated {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct JobDetails {
    state: JobState,
}

#[derive(Debug, Deserialize)]
struct JobState {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SourcePredictions {
    #[serde(default)]
    results: Option<SourceResults>,
}

#[derive(Debug, Deserialize)]
struct SourceResults {
    #[serde(default)]
    predictions: Vec<FilePredictions>,
}

#[derive(Debug, Deserialize)]
struct FilePredictions {
    #[serde(default)]
    models: ModelPredictions,
}

#[derive(Debug, Default, Deserialize)]
struct ModelPredictions {
    face: Option<ModelGroups>,
    prosody: Option<ModelGroups>,
}

#[derive(Debug, Deserialize)]
struct ModelGroups {
    #[serde(default)]
    grouped_predictions: Vec<PredictionGroup>,
}

#[derive(Debug, Deserialize)]
struct PredictionGroup {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(default)]
    emotions: Vec<EmotionScore>,
}

fn flatten_channel(groups: Option<ModelGroups>) -> Option<Vec<EmotionScore>> {
    groups.map(|g| {
        g.grouped_predictions
            .into_iter()
            .flat_map(|group| group.predictions)
            .flat_map(|p| p.emotions)
            .collect()
    })
}

fn merge_channel(into: &mut Option<Vec<EmotionScore>>, more: Option<Vec<EmotionScore>>) {
    if let Some(more) = more {
        into.get_or_insert_with(Vec::new).extend(more);
    }
}

fn report_from_predictions(sources: Vec<SourcePredictions>) -> MultimodalEmotionReport {
    let mut report = MultimodalEmotionReport::default();
    for file in sources
        .into_iter()
        .filter_map(|s| s.results)
        .flat_map(|r| r.predictions)
    {
        merge_channel(&mut report.face, flatten_channel(file.models.face));
        merge_channel(&mut report.prosody, flatten_channel(file.models.prosody));
    }
    report
}

pub struct HumeExpressionClient {
    client: Client,
    settings: HumeSettings,
}

impl HumeExpressionClient {
    pub fn new(settings: HumeSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { client, settings })
    }

    fn api_key(&self) -> Result<&str, AnalysisError> {
        self.settings
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AnalysisError::configuration("Hume API key is not configured"))
    }

    fn jobs_url(&self) -> String {
        format!("{}/v0/batch/jobs", self.settings.base_url.trim_end_matches('/'))
    }

    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, AnalysisError> {
        let response = request.send().await.map_err(AnalysisError::from_transport)?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(AnalysisError::from_transport)?;
        if !status.is_success() {
            warn!("Hume API returned {}", status);
            return Err(AnalysisError::from_status(status.as_u16(), body));
        }
        if body.trim().is_empty() {
            return Err(AnalysisError::empty_response("Hume API returned an empty body"));
        }
        serde_json::from_str(&body).map_err(|e| {
            AnalysisError::malformed(format!("unexpected Hume API response: {e}")).with_source(e)
        })
    }

    async fn submit(&self, api_key: &str, media_url: &str) -> Result<String, AnalysisError> {
        let body = json!({
            "urls": [media_url],
            "models": { "face": {}, "prosody": {} }
        });
        let created: JobCreated = self
            .send_json(
                self.client
                    .post(self.jobs_url())
                    .header("X-Hume-Api-Key", api_key)
                    .json(&body),
            )
            .await?;
        Ok(created.job_id)
    }

    async fn wait_for_completion(&self, api_key: &str, job_id: &str) -> Result<(), AnalysisError> {
        let url = format!("{}/{}", self.jobs_url(), job_id);
        for poll in 0..self.settings.max_polls {
            let details: JobDetails = self
                .send_json(self.client.get(&url).header("X-Hume-Api-Key", api_key))
                .await?;
            match details.state.status.as_str() {
                "COMPLETED" => return Ok(()),
                "FAILED" => {
                    return Err(AnalysisError::service(format!(
                        "expression job {job_id} failed: {}",
                        details.state.message.unwrap_or_default()
                    )))
                }
                other => debug!(job_id, poll, status = other, "expression job still running"),
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
        Err(AnalysisError::timeout(format!(
            "expression job {job_id} did not finish after {} polls",
            self.settings.max_polls
        )))
    }
}

#[async_trait]
impl ExpressionMeasurer for HumeExpressionClient {
    async fn measure(&self, media_url: &str) -> Result<MultimodalEmotionReport, AnalysisError> {
        let api_key = self.api_key()?;
        let job_id = self.submit(api_key, media_url).await?;
        info!(job_id = %job_id, "submitted expression measurement job");

        self.wait_for_completion(api_key, &job_id).await?;

        let url = format!("{}/{}/predictions", self.jobs_url(), job_id);
        let sources: Vec<SourcePredictions> = self
            .send_json(self.client.get(&url).header("X-Hume-Api-Key", api_key))
            .await?;
        Ok(report_from_predictions(sources))
    }
}
