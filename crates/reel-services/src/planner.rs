//! Structured-output LLM planning: segmentation, visual planning and
//! motion decisions.

use async_trait::async_trait;
use reel_models::{Segment, SegmentKind};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{ServiceError, ServiceResult};

/// Per-segment output of the batched visual planning call.
#[derive(Debug, Clone, Deserialize)]
pub struct VisualPlan {
    pub visual_description: String,
    pub needs_real_world_search: bool,
}

/// Story-level planning decisions, all made by one LLM behind structured
/// JSON output so responses parse without prose scraping.
#[async_trait]
pub trait StoryPlanner: Send + Sync {
    /// Split the canonical script into tagged chunks of 10-15 words,
    /// preserving spelling and punctuation verbatim.
    async fn segment_script(&self, script: &str) -> ServiceResult<Vec<Segment>>;

    /// One batched call producing a visual plan for every segment.
    async fn plan_visuals(
        &self,
        segments: &[Segment],
        content_class: &str,
    ) -> ServiceResult<Vec<VisualPlan>>;

    /// Should this still image be animated? Returns the motion prompt when
    /// animation would help, `None` when the still should stay.
    async fn motion_decision(
        &self,
        segment_text: &str,
        visual_description: &str,
    ) -> ServiceResult<Option<String>>;
}

/// Configuration for the planner model.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl PlannerConfig {
    pub fn from_env() -> ServiceResult<Self> {
        let api_key = std::env::var("GENAI_API_KEY")
            .map_err(|_| ServiceError::invalid_response("GENAI_API_KEY is not set"))?;
        let base_url = std::env::var("GENAI_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());
        let model =
            std::env::var("PLANNER_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());
        Ok(Self {
            base_url,
            api_key,
            model,
        })
    }
}

pub struct LlmPlanner {
    config: PlannerConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GenerateCandidate>,
}

#[derive(Debug, Deserialize)]
struct GenerateCandidate {
    content: Option<GenerateContent>,
}

#[derive(Debug, Deserialize)]
struct GenerateContent {
    #[serde(default)]
    parts: Vec<GeneratePart>,
}

#[derive(Debug, Deserialize)]
struct GeneratePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireChunk {
    text: String,
    kind: String,
}

#[derive(Debug, Deserialize)]
struct WireMotion {
    animate: bool,
    #[serde(default)]
    motion_prompt: String,
}

impl LlmPlanner {
    pub fn new(config: PlannerConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// One structured-output call: prompt in, parsed JSON out.
    async fn structured<T: serde::de::DeserializeOwned>(
        &self,
        prompt: String,
        schema: serde_json::Value,
    ) -> ServiceResult<T> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&json!({
                "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
                "generationConfig": {
                    "response_mime_type": "application/json",
                    "response_schema": schema,
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::api(
                response.status().as_u16(),
                response.text().await.unwrap_or_default(),
            ));
        }

        let body: GenerateResponse = response.json().await?;
        let text = body
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.text)
            .ok_or_else(|| ServiceError::invalid_response("model returned no text part"))?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl StoryPlanner for LlmPlanner {
    async fn segment_script(&self, script: &str) -> ServiceResult<Vec<Segment>> {
        let prompt = format!(
            "Split the following script into consecutive chunks of 10 to 15 words. \
             Every chunk must reproduce the script text verbatim, preserving spelling \
             and punctuation exactly, with no words dropped, added or reordered. Tag \
             each chunk: \"narrative\" when its visual would be imagined or fictional \
             (not photographable in the real world), \"literal\" when it names a \
             real-world photographable subject.\n\nScript:\n{script}"
        );
        let schema = json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "text": { "type": "string" },
                    "kind": { "type": "string", "enum": ["narrative", "literal"] }
                },
                "required": ["text", "kind"]
            }
        });

        let chunks: Vec<WireChunk> = self.structured(prompt, schema).await?;
        if chunks.is_empty() {
            return Err(ServiceError::invalid_response("segmentation produced no chunks"));
        }

        let segments = chunks
            .into_iter()
            .map(|c| {
                let kind = match c.kind.as_str() {
                    "narrative" => SegmentKind::Narrative,
                    _ => SegmentKind::Literal,
                };
                Segment::new(c.text, kind, "")
            })
            .collect();
        Ok(segments)
    }

    async fn plan_visuals(
        &self,
        segments: &[Segment],
        content_class: &str,
    ) -> ServiceResult<Vec<VisualPlan>> {
        let listing = segments
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. [{:?}] {}", i + 1, s.kind, s.text))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "For each numbered chunk below, produce a visual plan. \
             `visual_description` is a clean, self-contained English description \
             suitable as an image search query or generation prompt (no chunk \
             numbers, no pronouns referring to other chunks). \
             `needs_real_world_search` is true only when the chunk depends on \
             current real-world imagery of a named person, place or event that \
             stock or generated media cannot supply. Content class: {content_class}. \
             Answer with exactly one plan per chunk, in order.\n\n{listing}"
        );
        let schema = json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "visual_description": { "type": "string" },
                    "needs_real_world_search": { "type": "boolean" }
                },
                "required": ["visual_description", "needs_real_world_search"]
            }
        });

        let plans: Vec<VisualPlan> = self.structured(prompt, schema).await?;
        if plans.len() != segments.len() {
            return Err(ServiceError::invalid_response(format!(
                "expected {} visual plans, got {}",
                segments.len(),
                plans.len()
            )));
        }
        debug!(count = plans.len(), "visual planning done");
        Ok(plans)
    }

    async fn motion_decision(
        &self,
        segment_text: &str,
        visual_description: &str,
    ) -> ServiceResult<Option<String>> {
        let prompt = format!(
            "A short video is narrating: \"{segment_text}\". The on-screen still \
             image shows: \"{visual_description}\". Decide whether subtle animation \
             of the still (camera push, drift, natural motion) would improve the \
             shot. If yes, give a concise motion prompt; if the still works better, \
             say no."
        );
        let schema = json!({
            "type": "object",
            "properties": {
                "animate": { "type": "boolean" },
                "motion_prompt": { "type": "string" }
            },
            "required": ["animate"]
        });

        let decision: WireMotion = self.structured(prompt, schema).await?;
        Ok((decision.animate && !decision.motion_prompt.is_empty())
            .then_some(decision.motion_prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn model_reply(server_body: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": server_body.to_string() }] }
            }]
        })
    }

    fn planner(server: &MockServer) -> LlmPlanner {
        LlmPlanner::new(
            PlannerConfig {
                base_url: server.uri(),
                api_key: "k".into(),
                model: "planner".into(),
            },
            reqwest::Client::new(),
        )
    }

    #[tokio::test]
    async fn test_segmentation_parses_tagged_chunks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/planner:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(model_reply(
                serde_json::json!([
                    { "text": "Once upon a time in a distant kingdom by the sea,", "kind": "narrative" },
                    { "text": "the Eiffel Tower glittered over Paris at midnight.", "kind": "literal" }
                ]),
            )))
            .mount(&server)
            .await;

        let segments = planner(&server)
            .segment_script("Once upon a time...")
            .await
            .unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].kind, SegmentKind::Narrative);
        assert_eq!(segments[1].kind, SegmentKind::Literal);
    }

    #[tokio::test]
    async fn test_empty_segmentation_is_structural_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/planner:generateContent"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(model_reply(serde_json::json!([]))),
            )
            .mount(&server)
            .await;

        let err = planner(&server).segment_script("script").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_plan_count_mismatch_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/planner:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(model_reply(
                serde_json::json!([
                    { "visual_description": "a castle on a cliff", "needs_real_world_search": false }
                ]),
            )))
            .mount(&server)
            .await;

        let segments = vec![
            Segment::new("a", SegmentKind::Narrative, ""),
            Segment::new("b", SegmentKind::Literal, ""),
        ];
        let err = planner(&server)
            .plan_visuals(&segments, "story")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_motion_decision_no_animation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/planner:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(model_reply(
                serde_json::json!({ "animate": false }),
            )))
            .mount(&server)
            .await;

        let decision = planner(&server)
            .motion_decision("text", "a static chart")
            .await
            .unwrap();
        assert!(decision.is_none());
    }
}
