use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod html;
mod query;
mod server;
mod store;
mod types;

#[derive(Parser, Debug)]
#[command(name = "studiario")]
#[command(about = "Track study tasks with deadlines and serve a web view")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory holding the task store
    #[arg(short, long, default_value = ".", global = true)]
    data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Render a static HTML snapshot (no server)
    Build,

    /// Write the task collection to a JSON export file
    Export {
        /// Destination path
        #[arg(short, long, default_value = "study-tasks.json")]
        out: PathBuf,
    },
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level))
        .add_directive("hyper=warn".parse().unwrap());

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_max_level(Level::TRACE)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args.log_level);

    match args.command {
        // Default to serve if no command specified
        None | Some(Commands::Serve { port: 8080 }) => {
            server::serve(8080, args.data_dir).await?;
        }
        Some(Commands::Serve { port }) => {
            server::serve(port, args.data_dir).await?;
        }
        Some(Commands::Build) => {
            let store = store::TaskStore::load(args.data_dir.join(store::STORE_FILE))
                .context("Failed to load task store")?;
            let html_path = args.data_dir.join("index.html");
            html::generate_html(store.tasks(), Local::now().date_naive(), &html_path)?;
            info!(path = %html_path.display(), "HTML saved");
        }
        Some(Commands::Export { out }) => {
            let store = store::TaskStore::load(args.data_dir.join(store::STORE_FILE))
                .context("Failed to load task store")?;
            let json = serde_json::to_string_pretty(store.tasks())?;
            std::fs::write(&out, json)
                .with_context(|| format!("Failed to write export to {}", out.display()))?;
            info!(count = store.len(), path = %out.display(), "Tasks exported");
        }
    }

    Ok(())
}
