mod config;
mod errors;
mod ingest;
mod layout;
mod render;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::ingest::{records_from_rows, rows_from_workbook, Row};
use crate::render::logo::{load_logo, LogoAsset};
use crate::render::render_pdf;
use crate::routes::build_router;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "precedence-api", about = "Precedence card layout and PDF generation")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Render a spreadsheet or JSON rows file straight to a PDF.
    Render {
        /// Workbook (.xlsx, .xls, .ods; first sheet is read) or JSON array of rows.
        input: PathBuf,
        /// Logo image (PNG/JPEG). Falls back to LOGO_PATH.
        #[arg(long)]
        logo: Option<PathBuf>,
        #[arg(short, long, default_value = "precedencias.pdf")]
        output: PathBuf,
        /// Card preset: standard or large. Overrides CARD_PRESET.
        #[arg(long)]
        preset: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let preset = match &cli.command {
        Some(Command::Render { preset, .. }) => preset.as_deref(),
        _ => None,
    };
    let config = Config::from_env(preset)?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let grid = config.layout.validate()?;
    info!(
        columns = grid.columns,
        rows = grid.rows,
        cards_per_page = grid.slots_per_page,
        "Layout validated"
    );

    match cli.command {
        Some(Command::Render {
            input,
            logo,
            output,
            ..
        }) => render_file(&config, &input, logo.as_deref(), &output),
        Some(Command::Serve) | None => serve(config).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting Precedence API v{}", env!("CARGO_PKG_VERSION"));

    let default_logo = config.logo_path.as_deref().and_then(load_logo_or_warn);
    if let Some(logo) = &default_logo {
        info!(
            "Default logo loaded: {} ({}x{})",
            logo.source_name, logo.width_px, logo.height_px
        );
    }

    let state = AppState {
        config: config.clone(),
        default_logo: default_logo.map(Arc::new),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn render_file(config: &Config, input: &Path, logo: Option<&Path>, output: &Path) -> Result<()> {
    let rows = read_rows(input)?;
    let records = records_from_rows(&rows)?;

    let logo = logo
        .or(config.logo_path.as_deref())
        .and_then(load_logo_or_warn);

    let (pdf, summary) = render_pdf(&records, &config.layout, logo.as_ref())?;
    std::fs::write(output, &pdf)
        .with_context(|| format!("failed to write {}", output.display()))?;

    info!(
        output = %output.display(),
        pages = summary.pages,
        cards = summary.cards,
        overflows = summary.overflows,
        "PDF written"
    );
    Ok(())
}

/// Workbook extensions go through the sheet reader; anything else must be JSON.
fn read_rows(input: &Path) -> Result<Vec<Row>> {
    let raw = std::fs::read(input)
        .with_context(|| format!("failed to read rows from {}", input.display()))?;
    let extension = input
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("xlsx" | "xlsm" | "xls" | "ods") => rows_from_workbook(&raw)
            .with_context(|| format!("failed to read workbook {}", input.display())),
        _ => serde_json::from_slice(&raw)
            .with_context(|| format!("{} must hold a JSON array of objects", input.display())),
    }
}

fn load_logo_or_warn(path: &Path) -> Option<LogoAsset> {
    match load_logo(path) {
        Ok(logo) => Some(logo),
        Err(e) => {
            warn!(error = %e, "logo unavailable, rendering without it");
            None
        }
    }
}
