//! Render worker binary.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_providers::{
    AssetResolver, ContentImageGen, GenerativeProvider, InlineGenConfig, LongRunningMotion,
    MotionConfig, MotionProvider, PredictImageGen, SearchProvider, StockPhotoSearch,
    StockSearchConfig, TaskImageConfig, TaskImageGen, WebImageSearch, WebSearchConfig,
};
use reel_services::{
    HttpRenderClient, HttpSttClient, HttpTtsClient, LlmPlanner, PlannerConfig, RenderConfig,
    SttConfig, TtsConfig,
};
use reel_store::FileJobStore;
use reel_worker::{RenderPipeline, WorkerConfig, WorkerLoop};

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("reel=info,reel_worker=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("starting reel-worker");
    let config = WorkerConfig::from_env();
    info!(?config, "worker config loaded");

    let store = Arc::new(
        FileJobStore::open(&config.store_path)
            .await
            .context("failed to open job store")?,
    );

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .context("failed to build HTTP client")?;

    let synthesizer = Arc::new(HttpTtsClient::new(TtsConfig::from_env()?, http.clone()));
    let transcriber = Arc::new(HttpSttClient::new(SttConfig::from_env()?, http.clone()));
    let planner = Arc::new(LlmPlanner::new(PlannerConfig::from_env()?, http.clone()));
    let renderer = Arc::new(HttpRenderClient::new(RenderConfig::from_env()?, http.clone()));

    // Optional providers: a missing key just shortens the fallback chain.
    let web_search: Option<Arc<dyn SearchProvider>> = WebSearchConfig::from_env()
        .map(|c| Arc::new(WebImageSearch::new(c, http.clone())) as Arc<dyn SearchProvider>);
    let stock: Option<Arc<dyn SearchProvider>> = StockSearchConfig::from_env()
        .map(|c| Arc::new(StockPhotoSearch::new(c, http.clone())) as Arc<dyn SearchProvider>);

    let mut generative: Vec<Arc<dyn GenerativeProvider>> = Vec::new();
    if let Some(c) = TaskImageConfig::from_env() {
        generative.push(Arc::new(TaskImageGen::new(c, http.clone())));
    }
    if let Some(c) = InlineGenConfig::from_env("PREDICT_IMAGE_MODEL", "imagen-4.0-generate-001") {
        generative.push(Arc::new(PredictImageGen::new(c, http.clone())));
    }
    if let Some(c) = InlineGenConfig::from_env("CONTENT_IMAGE_MODEL", "gemini-3-pro-image-preview")
    {
        generative.push(Arc::new(ContentImageGen::new(c, http.clone())));
    }
    let batch_generator = generative.first().cloned();

    let motion: Option<Arc<dyn MotionProvider>> = MotionConfig::from_env()
        .map(|c| Arc::new(LongRunningMotion::new(c, http.clone())) as Arc<dyn MotionProvider>);

    let resolver = AssetResolver::new(web_search, generative, stock, http);
    let pipeline = Arc::new(RenderPipeline::new(
        synthesizer,
        transcriber,
        planner,
        renderer,
        resolver,
        motion,
        batch_generator,
        config.work_dir.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal");
        shutdown_tx.send(true).ok();
    });

    WorkerLoop::new(store, pipeline, config, shutdown_rx)
        .run()
        .await;

    info!("worker shutdown complete");
    Ok(())
}
