use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use foodgram_server::config::Config;
use foodgram_server::{api, app, db, loader, telemetry, AppState};

#[derive(Parser)]
#[command(name = "foodgram-server")]
#[command(about = "Foodgram recipe sharing backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print the OpenAPI document and exit
    Openapi,
    /// Load ingredients from a JSON file and create the default tags
    LoadData {
        /// JSON array of {name, measurement_unit}
        #[arg(long)]
        ingredients: Option<PathBuf>,
        /// Do not create the default tags
        #[arg(long)]
        skip_tags: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Openapi => {
            let spec = api::openapi()
                .to_pretty_json()
                .context("failed to serialize OpenAPI document")?;
            println!("{}", spec);
            Ok(())
        }
        Command::LoadData {
            ingredients,
            skip_tags,
        } => {
            let _telemetry = telemetry::init_telemetry()?;
            let config = Config::from_env()?;
            let pool = db::create_pool(&config.database_url)?;
            loader::load_data(&pool, ingredients.as_deref(), skip_tags)?;
            Ok(())
        }
        Command::Serve => serve().await,
    }
}

async fn serve() -> Result<()> {
    let _telemetry = telemetry::init_telemetry()?;

    let config = Config::from_env()?;
    let pool = db::create_pool(&config.database_url)?;
    let bind_addr = config.bind_addr;
    let public_url = config.public_url.clone();

    let app = app(AppState::new(pool, config));

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Server listening on {}", listener.local_addr()?);
    tracing::info!("Swagger UI available at {}/swagger-ui/", public_url);
    tracing::info!("OpenAPI spec available at {}/api-docs/openapi.json", public_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
