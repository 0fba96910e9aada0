use argh::FromArgs;
use pengu_server::{create_router, AppState, Config};
use tokio::sync::watch;

#[derive(FromArgs)]
/// Pengu weather backend
struct Args {
    /// port to listen on (overrides the PORT environment variable)
    #[argh(option, short = 'p')]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::init_from_env(env);

    let args: Args = argh::from_env();

    let mut config = Config::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }
    if config.dev_mode {
        log::warn!("DEV_MODE is enabled: authentication is bypassed");
    }

    let port = config.port;
    let state = AppState::new(config)?;
    let router = create_router(state);

    // Create shutdown channel
    let (shutdown_tx, mut shutdown_rx) = watch::channel(());

    // Set up Ctrl+C handler
    ctrlc::set_handler({
        let shutdown_tx = shutdown_tx.clone();
        move || {
            log::info!("Received Ctrl+C, shutting down gracefully...");
            shutdown_tx.send(()).ok();
        }
    })?;

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    log::info!("Server is running on port {}", port);
    log::info!("Health check: http://localhost:{}/health", port);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_rx.changed().await.ok();
        })
        .await?;

    log::info!("Server stopped.");

    Ok(())
}
