//! mcpdesk - MCP server manager for the Claude desktop app
//!
//! Usage:
//!   mcpdesk list                 # Show configured servers
//!   mcpdesk catalog --refresh    # Browse the published server catalog
//!   mcpdesk install <name>       # Add a catalog server to the config
//!   mcpdesk restore              # Roll back to the latest backup

mod desktop;
mod interactive;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcpdesk_core::catalog::{CacheStore, CatalogOrigin, CatalogSynchronizer, SyncOptions};
use mcpdesk_core::config::{BackupEntry, ConfigStore, OverrideRecord, PathResolver};
use mcpdesk_core::types::{CatalogRecord, ServerRecord};

use crate::interactive::Prompter;

#[derive(Parser)]
#[command(name = "mcpdesk")]
#[command(about = "Manage MCP servers in the Claude desktop config", long_about = None)]
struct Cli {
    /// Use this config file instead of the resolved one
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    /// Restart the desktop app after a successful change
    #[arg(long, global = true)]
    restart: bool,

    /// Skip all confirmation prompts
    #[arg(short = 'y', long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which config file is in use
    Path,

    /// Point the manager at a different config location
    SetPath {
        /// Directory holding claude_desktop_config.json
        #[arg(conflicts_with_all = ["file", "clear"])]
        dir: Option<PathBuf>,

        /// Exact config file to use
        #[arg(long, conflicts_with = "clear")]
        file: Option<PathBuf>,

        /// Forget any override and use the platform default
        #[arg(long)]
        clear: bool,
    },

    /// List configured servers
    #[command(alias = "ls")]
    List,

    /// Add a server entry
    Add(AddArgs),

    /// Remove a server by name
    #[command(alias = "rm")]
    Remove { name: String },

    /// Move a server to a new position (0-based)
    Move { from: usize, to: usize },

    /// Mark a server enabled
    Enable { name: String },

    /// Mark a server disabled
    Disable { name: String },

    /// List config backups, most recent first
    Backups,

    /// Restore a backup over the config (the most recent by default)
    Restore {
        /// Backup file name as shown by `backups`
        file: Option<String>,
    },

    /// Show the server catalog
    Catalog(CatalogArgs),

    /// Add a catalog server to the config
    Install {
        /// Catalog server name (case-insensitive)
        name: String,

        /// Environment variable value (KEY=VALUE)
        #[arg(long, value_name = "KEY=VALUE")]
        env: Vec<String>,

        #[command(flatten)]
        sync: SyncArgs,
    },
}

#[derive(Args)]
struct AddArgs {
    /// Server name (key under mcpServers)
    name: String,

    /// Executable to launch
    #[arg(long, short)]
    command: Option<String>,

    #[arg(long, short)]
    description: Option<String>,

    #[arg(long)]
    category: Option<String>,

    /// Environment variable (KEY=VALUE)
    #[arg(long, value_name = "KEY=VALUE")]
    env: Vec<String>,

    /// Arguments passed to the command (after --)
    #[arg(last = true)]
    args: Vec<String>,
}

#[derive(Args)]
struct CatalogArgs {
    /// Ignore the cache and download the catalog again
    #[arg(long)]
    refresh: bool,

    /// Only show servers in this category
    #[arg(long)]
    category: Option<String>,

    #[command(flatten)]
    sync: SyncArgs,
}

#[derive(Args)]
struct SyncArgs {
    /// Catalog document URL
    #[arg(long)]
    url: Option<String>,

    /// Cache lifetime in seconds
    #[arg(long, value_name = "SECS")]
    ttl: Option<u64>,

    /// Download timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcpdesk=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let changed = run(&cli)?;

    if changed && cli.restart {
        desktop::restart()?;
        println!("Restarted the desktop app");
    }
    Ok(())
}

/// Runs one command; returns whether the config file was modified.
fn run(cli: &Cli) -> Result<bool> {
    let resolver = PathResolver::from_env();
    let store = match &cli.config {
        Some(path) => ConfigStore::new(path.clone()),
        None => ConfigStore::from_resolver(&resolver),
    };
    let prompter = Prompter::new(cli.yes);

    match &cli.command {
        Commands::Path => {
            print_path(&resolver, &store, cli.format)?;
            Ok(false)
        }
        Commands::SetPath { dir, file, clear } => {
            run_set_path(&resolver, dir.as_ref(), file.as_ref(), *clear)?;
            Ok(false)
        }
        Commands::List => {
            print_servers(&store.get_servers(), cli.format)?;
            Ok(false)
        }
        Commands::Add(args) => {
            let record = server_from_args(args)?;
            let name = record.name.clone();
            store.add_server(record)?;
            println!("{} Added server '{}'", style("✓").green(), name);
            Ok(true)
        }
        Commands::Remove { name } => {
            store.remove_server(name)?;
            println!("{} Removed server '{}'", style("✓").green(), name);
            Ok(true)
        }
        Commands::Move { from, to } => {
            store.move_server(*from, *to)?;
            println!("{} Moved server {} → {}", style("✓").green(), from, to);
            Ok(true)
        }
        Commands::Enable { name } => {
            store.set_enabled(name, true)?;
            println!("{} Enabled '{}'", style("✓").green(), name);
            Ok(true)
        }
        Commands::Disable { name } => {
            store.set_enabled(name, false)?;
            println!("{} Disabled '{}'", style("✓").green(), name);
            Ok(true)
        }
        Commands::Backups => {
            print_backups(&store.list_backups(), cli.format)?;
            Ok(false)
        }
        Commands::Restore { file } => run_restore(&store, file.as_deref(), &prompter),
        Commands::Catalog(args) => {
            let sync = synchronizer(&args.sync)?;
            let snapshot = sync.sync(args.refresh);
            let records: Vec<_> = snapshot
                .records
                .iter()
                .filter(|r| {
                    args.category
                        .as_deref()
                        .is_none_or(|c| r.category.eq_ignore_ascii_case(c))
                })
                .collect();
            print_catalog(&records, snapshot.origin, cli.format)?;
            Ok(false)
        }
        Commands::Install { name, env, sync } => {
            let catalog = synchronizer(sync)?.get_catalog(false);
            let record = find_catalog_record(&catalog, name)
                .with_context(|| format!("No catalog server named '{}'", name))?;
            let mut values = parse_env_pairs(env)?;
            prompter.fill_env(&record.env_vars, &mut values)?;
            store.add_server(record.to_server_record(&values))?;
            println!("{} Installed '{}' from catalog", style("✓").green(), record.name);
            Ok(true)
        }
    }
}

fn run_set_path(
    resolver: &PathResolver,
    dir: Option<&PathBuf>,
    file: Option<&PathBuf>,
    clear: bool,
) -> Result<()> {
    if clear {
        resolver.clear_override()?;
        println!("Using default config path");
        return Ok(());
    }

    let record = match (dir, file) {
        (_, Some(file)) => {
            if !file.is_file() {
                anyhow::bail!("Config file does not exist: {}", file.display());
            }
            OverrideRecord::file(file)
        }
        (Some(dir), None) => OverrideRecord::directory(dir),
        (None, None) => anyhow::bail!("Give a directory, --file <FILE> or --clear"),
    };
    resolver.write_override(&record)?;
    println!(
        "Config path set to {}",
        style(resolver.resolve_config_path().display()).cyan()
    );
    Ok(())
}

fn run_restore(store: &ConfigStore, file: Option<&str>, prompter: &Prompter) -> Result<bool> {
    let chosen = match file {
        Some(name) => Some(
            store
                .backups()
                .find(name)
                .with_context(|| format!("No backup named '{}'", name))?,
        ),
        None => None,
    };

    let label = chosen
        .as_ref()
        .map(|e| e.filename.clone())
        .unwrap_or_else(|| "the most recent backup".to_string());
    if !prompter.confirm(&format!("Overwrite the config with {}?", label))? {
        println!("Restore cancelled.");
        return Ok(false);
    }

    let restored = store.restore(chosen.as_ref())?;
    println!(
        "{} Restored config from {}",
        style("✓").green(),
        restored.filename
    );
    Ok(true)
}

fn synchronizer(args: &SyncArgs) -> Result<CatalogSynchronizer> {
    let mut options = SyncOptions::default();
    if let Some(url) = &args.url {
        options.url = url.clone();
    }
    if let Some(ttl) = args.ttl {
        options.ttl = Duration::from_secs(ttl);
    }
    if let Some(timeout) = args.timeout {
        options.timeout = Duration::from_secs(timeout);
    }
    options.validate()?;
    Ok(CatalogSynchronizer::new(
        CacheStore::default_location(),
        options,
    ))
}

fn server_from_args(args: &AddArgs) -> Result<ServerRecord> {
    let mut record = ServerRecord::named(&args.name);
    record.command = args.command.clone();
    record.args = args.args.clone();
    record.env = parse_env_pairs(&args.env)?;
    if let Some(description) = &args.description {
        record.description = description.clone();
    }
    if let Some(category) = &args.category {
        record.category = category.clone();
    }
    Ok(record)
}

fn parse_env_pairs(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            let (key, value) = pair
                .split_once('=')
                .with_context(|| format!("Expected KEY=VALUE, got '{}'", pair))?;
            if key.trim().is_empty() {
                anyhow::bail!("Empty variable name in '{}'", pair);
            }
            Ok((key.trim().to_string(), value.to_string()))
        })
        .collect()
}

fn find_catalog_record<'a>(catalog: &'a [CatalogRecord], name: &str) -> Option<&'a CatalogRecord> {
    catalog
        .iter()
        .find(|r| r.name == name)
        .or_else(|| catalog.iter().find(|r| r.name.eq_ignore_ascii_case(name)))
}

fn print_path(resolver: &PathResolver, store: &ConfigStore, format: OutputFormat) -> Result<()> {
    let override_record = resolver.read_override();
    match format {
        OutputFormat::Table => {
            println!("Config:  {}", style(store.config_path().display()).cyan());
            println!("Backups: {}", store.backups().backup_dir().display());
            match override_record {
                Some(_) => println!("Override: {}", resolver.override_file().display()),
                None => println!("Override: none"),
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "config": store.config_path(),
                "exists": store.config_path().exists(),
                "backups": store.backups().backup_dir(),
                "override": override_record,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn print_servers(servers: &[ServerRecord], format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(servers)?);
        return Ok(());
    }

    if servers.is_empty() {
        println!("No servers configured.");
        println!("Add one with: mcpdesk install <name>");
        return Ok(());
    }

    println!("{:<4} {:<24} {:<10} {:<9} Command", "#", "Name", "Category", "Enabled");
    println!("{}", "-".repeat(72));
    for (index, server) in servers.iter().enumerate() {
        let enabled = if server.enabled {
            style("yes").green()
        } else {
            style("no").dim()
        };
        let command = match &server.command {
            Some(command) if server.args.is_empty() => command.clone(),
            Some(command) => format!("{} {}", command, server.args.join(" ")),
            None => "-".to_string(),
        };
        println!(
            "{:<4} {:<24} {:<10} {:<9} {}",
            index,
            truncate(&server.name, 24),
            truncate(&server.category, 10),
            enabled,
            command
        );
    }
    Ok(())
}

fn print_backups(backups: &[BackupEntry], format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(backups)?);
        return Ok(());
    }

    if backups.is_empty() {
        println!("No backups yet.");
        return Ok(());
    }

    println!("{:<44} {:<20} {:>10}", "File", "Taken", "Size");
    println!("{}", "-".repeat(76));
    for entry in backups {
        let name = if entry.is_error() {
            style(entry.filename.as_str()).red()
        } else if entry.is_before_restore() {
            style(entry.filename.as_str()).yellow()
        } else {
            style(entry.filename.as_str())
        };
        println!(
            "{:<44} {:<20} {:>10}",
            name,
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.display_size()
        );
    }
    Ok(())
}

fn print_catalog(
    records: &[&CatalogRecord],
    origin: CatalogOrigin,
    format: OutputFormat,
) -> Result<()> {
    if let OutputFormat::Json = format {
        let output = serde_json::json!({
            "origin": origin,
            "servers": records,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let origin = match origin {
        CatalogOrigin::Cache => "cache",
        CatalogOrigin::Remote => "remote",
        CatalogOrigin::Fallback => "built-in list",
    };
    println!(
        "{} servers ({})",
        style(records.len()).bold(),
        style(origin).dim()
    );
    println!("{:<28} {:<10} {:<10} Description", "Name", "Type", "Category");
    println!("{}", "-".repeat(90));
    for record in records {
        println!(
            "{:<28} {:<10} {:<10} {}",
            truncate(&record.name, 28),
            record.source_type,
            truncate(&record.category, 10),
            truncate(&record.description, 60)
        );
    }
    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}…")
}
