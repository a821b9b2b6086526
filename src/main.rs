use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use hello_service::config::Settings;
use hello_service::handlers::AppState;
use hello_service::probes::Dependencies;

#[derive(Parser, Debug)]
#[command(name = "hello-service")]
#[command(about = "Greeting server with dependency diagnostics", long_about = None)]
struct Args {
    /// Host for HTTP server
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port for HTTP server
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// JSON config file holding the connection strings
    #[arg(long, env = "APP_CONFIG", default_value = "appsettings.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let settings = Settings::load(&args.config);
    let deps = Dependencies::from_settings(&settings);
    tracing::info!(
        "Dependencies: redis configured={}, sql configured={}",
        deps.redis_configured(),
        deps.sql_configured()
    );

    let state = Arc::new(AppState { deps });
    let app = hello_service::app(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
