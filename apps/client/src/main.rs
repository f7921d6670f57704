mod api_client;
mod catalog;
mod chat;
mod config;
mod errors;
mod flow;
mod models;
mod render;
mod store;
mod tags;
mod upload;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api_client::{ApiClient, ResumeBackend};
use crate::config::Config;
use crate::flow::terminal::Terminal;
use crate::flow::Flow;
use crate::render::{render, to_text};
use crate::store::{FileStore, ResultStore};

#[derive(Parser, Debug)]
#[command(name = "resume-client", version, about = "Terminal client for the resume parsing service")]
struct Cli {
    /// Backend base URL (overrides RESUME_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pick a template, upload a resume and chat about it (default)
    Run,
    /// Show the last saved result
    Last {
        /// Print the raw JSON export instead of the field view
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?.with_api_url(cli.api_url);

    // Logs go to stderr so they never interleave with the conversation on stdout
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("resume_client={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting resume-client v{}", env!("CARGO_PKG_VERSION"));

    let store = ResultStore::new(FileStore::new(&config.storage_dir));

    match cli.command.unwrap_or(Command::Run) {
        Command::Last { json } => show_last(&store, json),
        Command::Run => {
            let backend: Arc<dyn ResumeBackend> =
                Arc::new(ApiClient::new(&config.api_url, config.request_timeout)?);
            info!("Backend: {}", config.api_url);

            let mut terminal = Terminal::new(
                BufReader::new(tokio::io::stdin()),
                std::io::stdout(),
                backend,
                Flow::new(store),
                &config.export_dir,
            );
            terminal.run().await
        }
    }
}

fn show_last(store: &ResultStore, json: bool) -> Result<()> {
    let Some(record) = store.last()? else {
        println!("No saved result yet.");
        return Ok(());
    };

    if json {
        let bytes = crate::store::export_json(&record.data)?;
        println!("{}", String::from_utf8_lossy(&bytes));
    } else {
        println!(
            "{} · session {} · saved {}",
            record.schema_label,
            record.session_id,
            record.saved_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!();
        print!("{}", to_text(&render(&record.data, 0)));
    }
    Ok(())
}
