use anyhow::Result;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use offline_translator::{routes, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("offline_translator=debug,tower_http=debug")),
        )
        .init();

    let config_paths: Vec<String> = vec![
        std::env::var("CONFIG_PATH").ok(),
        Some("conf.yaml".to_string()),
        Some("conf.yml".to_string()),
        Some("conf.json".to_string()),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut config = None;
    for path in &config_paths {
        if !std::path::Path::new(path).exists() {
            debug!("No config at {}", path);
            continue;
        }
        config = Some(Config::load(path)?);
        info!("Loaded configuration from: {}", path);
        break;
    }
    let mut config = config.unwrap_or_else(|| {
        warn!("No config file found (tried {:?}); using defaults", config_paths);
        Config::default()
    });
    config.apply_env_overrides();
    config.validate()?;

    let app_state = AppState::new(config.clone())?;
    info!(
        "Translation engine at {}, supported languages {}",
        config.engine_config.base_url,
        config.supported_languages()?
    );

    if config.engine_config.update_index_on_startup {
        match app_state.registry.refresh_index().await {
            Ok(()) => info!("Package index updated"),
            Err(e) => warn!("Could not update package index: {}", e),
        }
    }

    let app = routes::build_app(app_state);

    let system_config = &config.system_config;
    let listener =
        tokio::net::TcpListener::bind((system_config.host.as_str(), system_config.port)).await?;
    info!("Starting server on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
