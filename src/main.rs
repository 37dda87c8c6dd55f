//! # Document Gateway CLI (`dgw`)
//!
//! The `dgw` binary runs the gateway server and offers the same operations
//! from the command line for inspection and debugging.
//!
//! ## Usage
//!
//! ```bash
//! dgw --config ./config/dgw.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dgw serve` | Build the collection index and start the HTTP server |
//! | `dgw databases` | List databases and their collections |
//! | `dgw schema [db]` | Print the inferred schema report for a database |
//! | `dgw aggregate <collection> --pipeline '<json>'` | Run a pipeline and print results |
//!
//! ## Examples
//!
//! ```bash
//! # Start the gateway
//! dgw serve --config ./config/dgw.toml
//!
//! # What's in this deployment?
//! dgw databases
//!
//! # Inferred schema for the default database
//! dgw schema
//!
//! # Count shipped orders (database inferred from the collection name)
//! dgw aggregate orders --pipeline '[{"$match": {"status": "shipped"}}, {"$count": "n"}]'
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use document_gateway::aggregate::run_aggregate;
use document_gateway::catalog;
use document_gateway::config;
use document_gateway::schema::build_schema;
use document_gateway::server::run_server;
use document_gateway::store::MongoStore;

/// Document Gateway — a MongoDB gateway for AI tools.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/dgw.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "dgw",
    about = "Document Gateway — schema inference, diagnostic aggregation, and database discovery over MongoDB",
    version,
    long_about = "Document Gateway exposes a MongoDB deployment to LLM-driven agents through \
    three operations: run an aggregation pipeline (with pre-flight diagnostics that explain \
    empty results), infer the effective schema of a database's collections, and list available \
    databases and collections."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/dgw.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server.
    ///
    /// Enumerates every database to build the collection→database index,
    /// then binds to `[server].bind` and serves until terminated.
    Serve,

    /// List databases and their collections.
    Databases,

    /// Print the inferred schema and one sample document per collection.
    ///
    /// Samples up to `[schema].sample_size` documents per collection and
    /// prints the merged field-path → types report as pretty JSON.
    Schema {
        /// Database name; defaults to `mongodb.default_db`.
        db: Option<String>,
    },

    /// Run an aggregation pipeline against a collection.
    ///
    /// The target database is resolved like the HTTP endpoint: `--db`
    /// first, then the collection index, then `mongodb.default_db`.
    Aggregate {
        /// Collection to aggregate over.
        collection: String,

        /// Pipeline as a JSON array of stages.
        #[arg(long)]
        pipeline: String,

        /// Target database; inferred from the collection when omitted.
        #[arg(long)]
        db: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = config::load_config(&cli.config)?;
    let store = Arc::new(MongoStore::connect(&config).await?);

    match cli.command {
        Commands::Serve => {
            run_server(&config, store).await?;
        }
        Commands::Databases => {
            let databases = catalog::list_databases(store.as_ref()).await?;
            println!("{}", serde_json::to_string_pretty(&databases)?);
        }
        Commands::Schema { db } => {
            let db_name = db
                .or_else(|| config.mongodb.default_db.clone())
                .ok_or_else(|| {
                    anyhow::anyhow!("no database given and mongodb.default_db is not configured")
                })?;
            let report = build_schema(store.as_ref(), &db_name, config.schema.sample_size).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Aggregate {
            collection,
            pipeline,
            db,
        } => {
            let raw: serde_json::Value = serde_json::from_str(&pipeline)
                .map_err(|e| anyhow::anyhow!("--pipeline is not valid JSON: {}", e))?;

            // The index is only needed when the database must be inferred.
            let index = if db.is_none() {
                catalog::build_collection_index(store.as_ref()).await?
            } else {
                Default::default()
            };

            let outcome = run_aggregate(
                store.as_ref(),
                &index,
                &config,
                db.as_deref(),
                &collection,
                &raw,
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}
