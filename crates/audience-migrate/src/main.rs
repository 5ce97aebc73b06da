//! audience-migrate CLI
//!
//! CLI tool for migrating templates, audiences and database connections
//! between two tenants of the REST API.

// CLI tool - relax pedantic lints for ergonomics
#![allow(clippy::pedantic)]

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use audience_migrate::config::ConfigFormat;
use audience_migrate::{MigrationConfig, MigrationReport, Migrator, PageRequest};

#[derive(Parser)]
#[command(name = "audience-migrate")]
#[command(version)]
#[command(
    about = "Migrate templates, audiences and database connections between API tenants",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path (INI, JSON or YAML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Dry run mode (read from the source, don't create at the destination)
    #[arg(long, global = true)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Page size override for listings
    #[arg(long, global = true)]
    page_size: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run migration from config file
    Run {
        /// Configuration file path
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },

    /// Validate configuration file without contacting either API
    Validate {
        /// Configuration file path
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },

    /// Generate example configuration
    Init {
        /// Output file path
        #[arg(short, long, default_value = "migration.yaml")]
        output: PathBuf,

        /// File format (defaults to the output file extension)
        #[arg(short, long, value_enum)]
        format: Option<InitFormat>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InitFormat {
    Yaml,
    Json,
    Ini,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Some(Commands::Run { config }) => {
            run_migration(&config, cli.dry_run, cli.page_size).await?;
        }
        Some(Commands::Validate { config }) => {
            validate_config(&config)?;
        }
        Some(Commands::Init { output, format }) => {
            generate_config(&output, format)?;
        }
        None => {
            // Default: run migration if config provided
            if let Some(config) = cli.config {
                run_migration(&config, cli.dry_run, cli.page_size).await?;
            } else {
                eprintln!("Usage: audience-migrate --config <FILE> or audience-migrate <COMMAND>");
                eprintln!("Try 'audience-migrate --help' for more information.");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn load_config(
    config_path: &Path,
    dry_run: bool,
    page_size: Option<u32>,
) -> anyhow::Result<MigrationConfig> {
    info!("Loading configuration from {:?}", config_path);

    let mut config = MigrationConfig::from_file(config_path)?;

    if dry_run {
        config.dry_run = true;
    }

    if let Some(size) = page_size {
        config.page_request = PageRequest::with_size(size)?;
    }

    Ok(config)
}

async fn run_migration(
    config_path: &Path,
    dry_run: bool,
    page_size: Option<u32>,
) -> anyhow::Result<()> {
    let config = load_config(config_path, dry_run, page_size)?;
    let migrator = Migrator::from_config(config)?;

    info!("Starting migration...");
    let report = migrator.run().await;

    print_report(&report);

    Ok(())
}

fn print_report(report: &MigrationReport) {
    println!("\n✅ Migration Complete!");
    if report.flows.is_empty() {
        println!("   No flow enabled (see the 'migrating' section)");
    }
    for flow in &report.flows {
        println!(
            "   {:<12} listed: {:<5} created: {:<5} failed: {:<5} skipped: {}",
            format!("{}s", flow.kind),
            flow.listed,
            flow.created(),
            flow.failed(),
            flow.skipped()
        );
    }
    println!("   Duration:  {:.2}s", report.duration_secs);

    let failures: Vec<_> = report.events().filter(|e| e.outcome.is_failure()).collect();
    if !failures.is_empty() {
        println!("\n⚠️  {} record(s) were not migrated:", failures.len());
        for event in failures {
            println!("   - {} '{}': {}", event.kind, event.identifier, event.outcome);
        }
    }
}

fn validate_config(config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path, false, None)?;

    println!("✅ Configuration is valid!");
    println!("   Source:       {}", config.source.url);
    println!("   Destination:  {}", config.destination.url);
    println!(
        "   Flows:        templates={} audiences={} databases={}",
        config.migrating.templates, config.migrating.audiences, config.migrating.databases
    );
    println!("   Databases:    {} configured", config.databases.len());
    println!("   Page size:    {}", config.page_request.size());

    Ok(())
}

fn generate_config(output: &Path, format: Option<InitFormat>) -> anyhow::Result<()> {
    let format = match format {
        Some(format) => format,
        None => match ConfigFormat::from_path(output)? {
            ConfigFormat::Yaml => InitFormat::Yaml,
            ConfigFormat::Json => InitFormat::Json,
            ConfigFormat::Ini => InitFormat::Ini,
        },
    };

    let template = match format {
        InitFormat::Yaml => YAML_TEMPLATE,
        InitFormat::Json => JSON_TEMPLATE,
        InitFormat::Ini => INI_TEMPLATE,
    };

    std::fs::write(output, template)?;
    println!("✅ Generated configuration: {:?}", output);
    println!(
        "   Edit the file and run: audience-migrate run --config {:?}",
        output
    );

    Ok(())
}

const YAML_TEMPLATE: &str = r#"# audience-migrate configuration
source:
  url: https://api.source.example.com/
  ApiKey: your-source-api-key
  CustomerId: your-source-customer-id

destination:
  url: https://api.destination.example.com/
  ApiKey: your-destination-api-key
  CustomerId: your-destination-customer-id

# Secrets for connections that already exist in the source.
# Matched by name, case-insensitively.
databases:
  - name: warehouse
    host: warehouse.internal
    port: 5432
    user: etl
    password: change-me

migrating:
  templates: true
  audiences: true
  databases: false

options:
  page_size: 100
  dry_run: false
"#;

const JSON_TEMPLATE: &str = r#"{
  "source": {
    "url": "https://api.source.example.com/",
    "ApiKey": "your-source-api-key",
    "CustomerId": "your-source-customer-id"
  },
  "destination": {
    "url": "https://api.destination.example.com/",
    "ApiKey": "your-destination-api-key",
    "CustomerId": "your-destination-customer-id"
  },
  "databases": [
    {
      "name": "warehouse",
      "host": "warehouse.internal",
      "port": 5432,
      "user": "etl",
      "password": "change-me"
    }
  ],
  "migrating": {
    "templates": true,
    "audiences": true,
    "databases": false
  },
  "options": {
    "page_size": 100,
    "dry_run": false
  }
}
"#;

const INI_TEMPLATE: &str = r#"; audience-migrate configuration
[source]
url = https://api.source.example.com/
ApiKey = your-source-api-key
CustomerId = your-source-customer-id

[destination]
url = https://api.destination.example.com/
ApiKey = your-destination-api-key
CustomerId = your-destination-customer-id

; One [database.<name>] section per connection that needs secrets
[database.warehouse]
host = warehouse.internal
port = 5432
user = etl
password = change-me

[migrating]
templates = true
audiences = true
databases = false

[options]
page_size = 100
dry_run = false
"#;
