mod engine;
mod generation;
mod routes;
mod store;

use crate::engine::AnalysisPipeline;
use crate::generation::ChatClient;
use crate::store::RecordStore;
use env_logger::Env;
use log::{error, info};
use serde::Deserialize;
use std::process::exit;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use utoipa_redoc::Redoc;
use utoipa_redoc::Servable;

fn get_default_port() -> u16 {
    8080
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default = "get_default_port")]
    port: u16,
    base_url: String,
    openai_api_key: String,
    model: String,
}

#[derive(Clone)]
struct AppState {
    pipeline: Arc<AnalysisPipeline<ChatClient>>,
    store: Arc<RecordStore>,
}

#[derive(OpenApi)]
#[openapi(info(description = "API for analyzing dance recordings and comparing student progress"))]
struct ApiDoc;

async fn run() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let config = envy::from_env::<Config>()?;

    let store = Arc::new(RecordStore::new());
    let generator = ChatClient::new(config.base_url, config.openai_api_key, config.model);
    let pipeline = Arc::new(AnalysisPipeline::new(generator, store.clone()));

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(routes::analyze))
        .routes(routes!(routes::get_recording))
        .routes(routes!(routes::list_recordings))
        .routes(routes!(routes::compare))
        .routes(routes!(routes::stats))
        .split_for_parts();

    info!("Starting on port {}", config.port);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    axum::serve(
        listener,
        router
            .merge(Redoc::with_url("/redoc", api))
            .with_state(AppState { pipeline, store }),
    )
    .await?;

    Ok(())
}

fn main() {
    let rt = tokio::runtime::Runtime::new().unwrap();

    if let Err(err) = rt.block_on(run()) {
        error!("{}", err);
        exit(1)
    }
}
