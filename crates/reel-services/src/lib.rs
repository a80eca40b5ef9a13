//! Clients for the structural external services: speech synthesis,
//! transcription, story planning and rendering. Each sits behind a trait
//! so the pipeline runs against fakes in tests.

mod error;
mod planner;
mod render;
mod stt;
mod tts;

pub use error::{ServiceError, ServiceResult};
pub use planner::{LlmPlanner, PlannerConfig, StoryPlanner, VisualPlan};
pub use render::{HttpRenderClient, RenderConfig, VideoRenderer};
pub use stt::{HttpSttClient, SttConfig, Transcriber};
pub use tts::{HttpTtsClient, SpeechSynthesizer, TtsConfig};
