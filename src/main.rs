use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod charts;
mod config;
mod loader;
mod metrics;
mod models;
mod page;
mod render;
mod server;

use config::{ServeConfig, ServeMode};
use loader::DataSet;
use page::LayoutVariant;

#[derive(Parser)]
#[command(name = "camcovid-dashboard")]
#[command(about = "University of Cambridge COVID-19 testing dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the data, build the page and serve it over HTTP
    Serve {
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        /// Overrides the PORT environment variable
        #[arg(long)]
        port: Option<u16>,
        #[arg(long, value_enum, default_value_t = LayoutVariant::Full)]
        variant: LayoutVariant,
    },
    /// Write the page and its stylesheet to disk
    Render {
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        #[arg(long, value_enum, default_value_t = LayoutVariant::Full)]
        variant: LayoutVariant,
        #[arg(long, default_value = "page.html")]
        out: PathBuf,
    },
}

fn init_logging(mode: ServeMode) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(mode.log_directive()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build(data_dir: &Path, variant: LayoutVariant) -> anyhow::Result<String> {
    let data = DataSet::load(data_dir)
        .with_context(|| format!("failed to load data from {}", data_dir.display()))?;
    let page = page::build_page_from(&data, variant);
    info!(
        ?variant,
        charts = page.charts().count(),
        cards = page.cards.len(),
        "page composed"
    );
    Ok(render::render_page(&page))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mode = ServeMode::from_env()?;
    init_logging(mode);

    match cli.command {
        Commands::Serve {
            data_dir,
            port,
            variant,
        } => {
            let config = ServeConfig::from_env(port)?;
            info!(mode = ?config.mode, "starting dashboard");
            let html = build(&data_dir, variant)?;
            server::serve(server::AppState::new(html), config.addr()).await?;
        }
        Commands::Render {
            data_dir,
            variant,
            out,
        } => {
            let html = build(&data_dir, variant)?;
            std::fs::write(&out, html)
                .with_context(|| format!("failed to write {}", out.display()))?;

            let css_path = out
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(render::STYLESHEET_PATH.trim_start_matches('/'));
            if let Some(dir) = css_path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::write(&css_path, render::stylesheet())?;
            println!("Page written to {}.", out.display());
        }
    }

    Ok(())
}
