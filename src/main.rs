//! db-export - structured query export CLI.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use db_export::cli::{Cli, Command};
use db_export::config::Config;
use db_export::db::{self, DataStore};
use db_export::error::ExportError;
use db_export::export::{ExportDispatcher, ExportRequest};
use db_export::logging;
use db_export::page_values::{PageRef, PageValues};
use db_export::schema::SchemaCatalog;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse_args();

    match &cli.log_file {
        Some(path) => {
            if let Err(e) = logging::init_file_logging(path) {
                eprintln!("Warning: {e}");
                logging::init_stderr_logging();
            }
        }
        None => logging::init_stderr_logging(),
    }

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<ExportError>() {
            Some(export_error) => {
                error!("{}: {}", export_error.category(), export_error.detail());
                eprintln!("{}: {}", export_error.category(), export_error.detail());
            }
            None => {
                error!("{:#}", e);
                eprintln!("Error: {e:#}");
            }
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;

    if let Some(url) = &cli.database_url {
        config.store.url = Some(url.clone());
    }
    config.store.apply_env_defaults();

    let mut catalog = SchemaCatalog::from_declarations(&config.tables)?;
    let store = db::connect(&config.store).await?;
    if cli.load_schemas {
        let loaded = catalog.load_from_store(store.as_ref()).await?;
        info!("Loaded {} table schema(s) from the store", loaded);
    }

    let result = execute(&cli.command, &catalog, store.as_ref(), &config).await;
    if let Err(e) = store.close().await {
        warn!("Failed to close the store: {}", e);
    }
    result
}

async fn execute(
    command: &Command,
    catalog: &SchemaCatalog,
    store: &dyn DataStore,
    config: &Config,
) -> anyhow::Result<()> {
    match command {
        Command::Export { query, output } => {
            let request = ExportRequest::from_query_string(query);
            let response = ExportDispatcher::new(catalog, store, config)
                .dispatch(&request)
                .await;

            for (name, value) in response.headers() {
                eprintln!("{name}: {value}");
            }
            write_body(output.as_deref(), &response.body)
        }
        Command::PageValues {
            page_id,
            page_name,
            output,
        } => {
            let report = PageValues::new(catalog, store, config)
                .collect(&PageRef::new(*page_id, page_name.as_str()))
                .await;
            write_body(output.as_deref(), report.render_html().as_bytes())
        }
    }
}

fn write_body(output: Option<&Path>, body: &[u8]) -> anyhow::Result<()> {
    match output {
        Some(path) => std::fs::write(path, body)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(body).context("Failed to write to stdout")?;
            stdout.flush().context("Failed to flush stdout")
        }
    }
}
