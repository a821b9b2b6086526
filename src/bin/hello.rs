//! The first of the two servers: every request gets the same static greeting.

use anyhow::Result;
use axum::Router;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hello_service::handlers::home::GREETING;

#[derive(Parser, Debug)]
#[command(name = "hello")]
#[command(about = "Static greeting server", long_about = None)]
struct Args {
    /// Host for HTTP server
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port for HTTP server
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,
}

async fn hello() -> String {
    format!("{}\n", GREETING)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let app = Router::new().fallback(hello);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on port {}", args.port);

    axum::serve(listener, app).await?;

    Ok(())
}
