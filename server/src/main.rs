use anyhow::Context;
use clap::Parser;
use foodgram_server::{build_router, db, telemetry, AppState, Settings};

#[derive(Parser, Debug)]
#[command(name = "foodgram-server", about = "Recipe sharing API server")]
struct Args {
    /// Print the OpenAPI document and exit
    #[arg(long)]
    openapi: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.openapi {
        let spec = foodgram_server::api::openapi()
            .to_pretty_json()
            .context("Failed to serialize OpenAPI document")?;
        println!("{}", spec);
        return Ok(());
    }

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e).context("Failed to read .env");
        }
    }

    telemetry::init_telemetry()?;

    let settings = Settings::from_env()?;
    let pool = db::create_pool(&settings.database_url)?;
    tokio::fs::create_dir_all(&settings.media_root)
        .await
        .with_context(|| format!("Failed to create media root {}", settings.media_root.display()))?;

    let bind_addr = settings.bind_addr;
    let app = build_router(AppState::new(pool, settings));

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    let local_addr = listener.local_addr()?;

    tracing::info!("Server listening on {}", local_addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", local_addr);
    tracing::info!(
        "OpenAPI spec available at http://{}/api-docs/openapi.json",
        local_addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
