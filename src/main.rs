// src/main.rs — promptspec entry point

use std::path::PathBuf;

use clap::Parser;

use promptspec::cli::{self, Cli, Commands};
use promptspec::infra::config::Config;
use promptspec::infra::logger;
use promptspec::memory;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config (falls back to defaults if no config.toml), then env overrides
    let mut config = if let Some(ref path) = cli.config {
        let mut c = Config::load_from(std::path::Path::new(path))?;
        c.apply_overrides(|key| std::env::var(key).ok())?;
        c
    } else {
        Config::load()?
    };
    if let Some(ref db) = cli.db {
        config.database.path = Some(PathBuf::from(db));
    }

    // Initialize logging (respects RUST_LOG)
    logger::init_logging(&config.logging.level);

    let db_path = config.database.resolved_path();

    match cli.command {
        Commands::Migrate { status, rollback } => {
            cli::migrate::run_migrate(&db_path, status, rollback)
        }
        Commands::Serve { host, port } => {
            let store = memory::open_store(&db_path)?;
            cli::serve::run_serve(config, store, host, port).await
        }
        Commands::Generate { prompt } => {
            let store = memory::open_store(&db_path)?;
            cli::run::run_generate(&store, &prompt.join(" "))
        }
        Commands::Evaluate { report, file } => {
            let store = memory::open_store(&db_path)?;
            cli::run::run_evaluate(&store, report.as_deref(), file.as_deref())
        }
        Commands::Iterate {
            prompt,
            max_iters,
            json,
        } => {
            let store = memory::open_store(&db_path)?;
            cli::run::run_iterate(&store, &config, &prompt.join(" "), max_iters, json)
        }
        Commands::Report { id } => {
            let store = memory::open_store(&db_path)?;
            cli::run::run_report(&store, &id)
        }
    }
}
