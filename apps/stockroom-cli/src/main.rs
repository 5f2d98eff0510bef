//! # Stockroom CLI
//!
//! Command-line front end for the product store.
//!
//! ```text
//! stockroom <db-url> <db-user> <db-pass> [command] [--json]
//!      │
//!      ▼
//! StoreConfig::parse ──► PoolConfig (env overrides) ──► ConnectionPool
//!                                                           │
//!                                   schema::bootstrap ◄─────┤
//!                                                           ▼
//!                            Command::execute(ProductRepository) ──► stdout
//! ```
//!
//! Every failure is a `ClassifiedError`: its full message goes to stderr and
//! its code becomes the exit status.

mod commands;
mod config;
mod render;

use std::env;
use std::process;

use stockroom_core::{ClassifiedError, CoreResult, StoreConfig};
use stockroom_db::{schema, ConnectionPool};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::commands::Invocation;

const DEFAULT_LOG_FILTER: &str = "info,stockroom=debug,sqlx=warn";

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout carries only command output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    match run(env::args().skip(1)).await {
        Ok(output) => println!("{output}"),
        Err(err) => {
            eprintln!("{}", err.full_message());
            process::exit(err.code());
        }
    }
}

async fn run(args: impl Iterator<Item = String>) -> CoreResult<String> {
    let (store, rest) = StoreConfig::parse(args)?;
    let invocation = Invocation::parse(rest)?;
    let pool_config = config::load(&store)?;

    info!(url = %store.db_url, user = %store.db_user, "Connecting to store");
    debug!(config = ?pool_config, command = ?invocation.command, "Startup parameters");

    let pool = ConnectionPool::connect(pool_config).await?;

    let result = async {
        schema::bootstrap(&pool).await?;
        let outcome = invocation.command.execute(&pool.products()).await?;
        Ok::<_, ClassifiedError>(render::render(&outcome, invocation.json))
    }
    .await;

    pool.close().await;
    result
}
