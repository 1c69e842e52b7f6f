//! tablesync CLI
//!
//! Command-line front end for the entity tables of a tablesync server.
//!
//! # Commands
//!
//! - `tabs` - List the tables, marking the active one
//! - `use` - Make a table active (persisted between runs)
//! - `schema` - Describe a table's fields and key
//! - `list` - Load and print a table
//! - `add` - Create a record from `FIELD=VALUE` pairs
//! - `edit` - Update the record with the given key
//! - `delete` - Delete the record with the given key

mod commands;
mod shell;

use clap::{Parser, Subcommand};
use commands::Format;
use shell::Shell;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tablesync_engine::ClientConfig;
use tablesync_schema::Catalog;
use tracing_subscriber::EnvFilter;

/// Browse and edit tablesync entity tables.
#[derive(Parser)]
#[command(name = "tablesync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server origin
    #[arg(global = true, long, default_value = "http://localhost:8000")]
    base_url: String,

    /// Path prefix of the REST resources
    #[arg(global = true, long, default_value = "/api")]
    api_prefix: String,

    /// Request timeout in seconds
    #[arg(global = true, long, default_value_t = 30)]
    timeout: u64,

    /// Shell state file (remembers the active tab)
    #[arg(global = true, long, default_value = ".tablesync.json")]
    state: PathBuf,

    /// Output format
    #[arg(global = true, short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tables, marking the active one
    Tabs,

    /// Make a table active
    Use {
        /// Tab id or resource name
        tab: String,
    },

    /// Describe a table's fields and key
    Schema {
        /// Tab id or resource name (defaults to the active tab)
        #[arg(short, long)]
        tab: Option<String>,
    },

    /// Load and print a table
    List {
        /// Tab id or resource name (defaults to the active tab)
        #[arg(short, long)]
        tab: Option<String>,
    },

    /// Create a record
    Add {
        /// Tab id or resource name (defaults to the active tab)
        #[arg(short, long)]
        tab: Option<String>,

        /// Field values as FIELD=VALUE
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Update the record with the given key
    Edit {
        /// Tab id or resource name (defaults to the active tab)
        #[arg(short, long)]
        tab: Option<String>,

        /// Key values in key order (repeat for composite keys)
        #[arg(short, long = "key", required = true)]
        key: Vec<String>,

        /// Field values as FIELD=VALUE
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Delete the record with the given key
    Delete {
        /// Tab id or resource name (defaults to the active tab)
        #[arg(short, long)]
        tab: Option<String>,

        /// Key values in key order (repeat for composite keys)
        #[arg(short, long = "key", required = true)]
        key: Vec<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = ClientConfig::new(&cli.base_url)
        .with_api_prefix(&cli.api_prefix)
        .with_timeout(Duration::from_secs(cli.timeout));
    let mut shell = Shell::open(Catalog::standard()?, &cli.state);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Tabs => commands::tabs::list(&shell, &mut out)?,
        Commands::Use { tab } => commands::tabs::select(&mut shell, &tab, &mut out)?,
        Commands::Schema { tab } => {
            let entry = shell.resolve(tab.as_deref())?;
            commands::schema::run(&entry.schema, cli.format, &mut out)?;
        }
        Commands::List { tab } => {
            let table = connect(&shell, &config, tab.as_deref())?;
            commands::list::run(&table, cli.format, &mut out)?;
        }
        Commands::Add { tab, values } => {
            let table = connect(&shell, &config, tab.as_deref())?;
            commands::add::run(&table, &values, cli.format, &mut out)?;
        }
        Commands::Edit { tab, key, values } => {
            let table = connect(&shell, &config, tab.as_deref())?;
            commands::edit::run(&table, &key, &values, cli.format, &mut out)?;
        }
        Commands::Delete { tab, key } => {
            let table = connect(&shell, &config, tab.as_deref())?;
            commands::delete::run(&table, &key, &mut out)?;
        }
    }

    out.flush()?;
    Ok(())
}

fn connect(
    shell: &Shell,
    config: &ClientConfig,
    tab: Option<&str>,
) -> Result<tablesync_engine::HttpTableEngine, Box<dyn std::error::Error>> {
    let entry = shell.resolve(tab)?;
    Ok(tablesync_engine::connect(config, entry.schema.clone())?)
}
