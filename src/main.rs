use tokio::net::TcpListener;
use tracing::info;
use article_digest::{
    config::Config,
    api::routes::create_router,
    logging::init_logging,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration and set up logging
    let config = Config::load()?;
    init_logging(config.log_format)?;

    let server_addr = config.server_addr;
    info!("Starting server on {}", server_addr);

    // Create application state and build the router
    let app_state = AppState::from_config(config)?;
    let app = create_router(app_state);

    // Create the listener and start the server
    let listener = TcpListener::bind(server_addr).await?;
    info!("Listening on {}", server_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
