//! WowData lookup tool
//!
//! Resolves game entities through the tier chain described in a TOML file
//! and prints the records as JSON.
//!
//! Usage:
//!   wowdata --config wowdata.toml open item -p itemid=19019
//!   wowdata open realm --batch '[{"realm":"Gilneas"},{"realm":"Antonidas"}]'
//!   wowdata init-sqlite

use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use wowdata_access::{LookupRequest, LookupResult};
use wowdata_cli::{parse_param, result_json, CliConfig};
use wowdata_model::EntityType;
use wowdata_types::{ParamGroup, Value};

#[derive(Parser, Debug)]
#[command(name = "wowdata")]
#[command(about = "Tiered WowData lookups")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "wowdata.toml")]
    config: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up one entity, or a batch of them
    Open {
        /// Entity type (realm, character, item, ...)
        entity: EntityType,

        /// Lookup parameter as key=value
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, Value)>,

        /// JSON parameter mapping or list of mappings; overrides --param
        #[arg(long)]
        batch: Option<String>,
    },
    /// Create the tables of every configured SQLite tier
    InitSqlite,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let config = CliConfig::load(&args.config)?;
    match args.command {
        Command::Open {
            entity,
            params,
            batch,
        } => {
            let request = match batch {
                Some(raw) => {
                    let json: serde_json::Value =
                        serde_json::from_str(&raw).context("--batch is not valid JSON")?;
                    LookupRequest::from_value(Value::from(json))?
                }
                None => LookupRequest::Single(params.into_iter().collect::<ParamGroup>()),
            };

            let access = config.access()?;
            info!("Tiers: {}", access.tier_names().join(" -> "));
            let result = access.open(entity, request);
            match &result {
                LookupResult::Single(None) => println!("not found"),
                _ => println!("{}", serde_json::to_string_pretty(&result_json(&result))?),
            }

            for entry in access.log_entries() {
                eprintln!("{} {}", entry.time.format("%H:%M:%S%.3f"), entry.message);
            }
        }
        Command::InitSqlite => {
            let count = config.initialize_sqlite()?;
            info!("Initialized {count} SQLite tier(s)");
        }
    }
    Ok(())
}
