use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use waypoints_common::{logger, AppConfig};
use waypoints_embedding::build_embedder;
use waypoints_server::{search_waypoints, AppState};
use waypoints_store::{PgWaypointStore, WaypointStore};

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    if let Some(root) = find_project_root() {
        let env_path = root.join(".env");
        if env_path.exists() {
            dotenv::from_path(&env_path).ok();
            return;
        }
    }
    dotenv::dotenv().ok();
}

#[derive(Parser)]
#[command(name = "waypoints")]
#[command(about = "Waypoints - semantic search over travel waypoints", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Listen address (host:port), overrides SERVER_ADDR
        #[arg(long)]
        addr: Option<String>,
    },

    /// Run one semantic search and print the matches
    Search {
        /// Free-text query
        query: String,
    },

    /// Print the number of waypoints
    Count,
}

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    load_dotenv_from_project_root();

    let mut config = AppConfig::from_env()?;
    logger::setup_logging(config.log_dir.as_deref(), &config.log_level)?;

    match cli.command.unwrap_or(Commands::Serve { addr: None }) {
        Commands::Serve { addr } => {
            if let Some(addr) = addr {
                config.server_addr = addr;
                config.validate()?;
            }

            tracing::info!("Waypoints starting...");
            tracing::info!("Configuration loaded: {:?}", config);

            let store = PgWaypointStore::connect(&config).await?;
            let result = serve(&config, store.clone()).await;
            store.close().await;
            result?;
        }
        Commands::Search { query } => {
            let store = PgWaypointStore::connect(&config).await?;
            let result = search_once(&config, &store, &query).await;
            store.close().await;
            result?;
        }
        Commands::Count => {
            let store = PgWaypointStore::connect(&config).await?;
            let result = store.count().await;
            store.close().await;
            println!("{}", result?);
        }
    }

    Ok(())
}

async fn serve(config: &AppConfig, store: PgWaypointStore) -> Result<()> {
    store.ping().await?;
    tracing::info!("Database reachable");

    let embedder = build_embedder(config)?;
    let state = AppState::new(embedder, Arc::new(store));

    waypoints_server::start_server(config, state).await?;
    Ok(())
}

async fn search_once(config: &AppConfig, store: &PgWaypointStore, query: &str) -> Result<()> {
    let embedder = build_embedder(config)?;
    let results = search_waypoints(embedder.as_ref(), store, Some(query)).await?;

    println!("\nSearch results for: '{}'", query);
    println!("{}", "-".repeat(40));
    for result in results {
        let context: String = result.description.chars().take(100).collect();
        println!("[{:.1}% Match] {}", result.score, result.name);
        println!("   Context: {}...", context);
        println!();
    }

    Ok(())
}
