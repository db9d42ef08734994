use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use ddx_core::{CoreConfig, DefaultDiagnosisService};

const ENV_REST_ADDR: &str = "DDX_REST_ADDR";
const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Main entry point for the DDX application
///
/// Resolves configuration once, builds the diagnosis pipeline and serves the web form and the
/// JSON API on a single REST listener.
///
/// # Environment Variables
/// - `DDX_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `OPENAI_API_KEY`: completion service key; when missing, submissions fail with an
///   authentication error instead of the server refusing to start
/// - `DDX_COMPLETION_BASE_URL`, `DDX_MODEL`, `DDX_MAX_TOKENS`, `DDX_TEMPERATURE`
/// - `DDX_ONTOLOGY_SEARCH_URL`, `DDX_HPO_API_URL`
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration is invalid or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ddx_run=info".parse()?)
                .add_directive("ddx_core=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("hpo=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = CoreConfig::from_lookup(|name| std::env::var(name).ok())?;
    if cfg.completion().api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; submissions will fail until it is configured");
    }

    let rest_addr: SocketAddr = std::env::var(ENV_REST_ADDR)
        .unwrap_or_else(|_| DEFAULT_REST_ADDR.into())
        .parse()?;

    tracing::info!("++ Starting DDX REST on {}", rest_addr);
    tracing::info!(
        model = %cfg.completion().model,
        completion = %cfg.completion().base_url,
        ontology = %cfg.ontology_search_url(),
        "resolved configuration"
    );

    let service = DefaultDiagnosisService::from_config(&cfg)?;
    let app = router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
