mod api;
mod config;
mod location;
mod logging;
mod models;
mod tui;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = config::AppConfig::from_env()?;
    config.ensure_filesystem()?;
    logging::initialize_logging(&config)?;

    info!(
        api = config.api_base_url(),
        location = ?config.location_source(),
        "starting"
    );

    let client = api::RecommendClient::new(&config)?;
    let locator = location::from_config(&config)?;
    let (controller, state_rx) = tui::ViewController::new(Arc::new(client), locator);

    let app = tui::App::new(controller, state_rx, config.page_title());
    tui::run(app).await
}
