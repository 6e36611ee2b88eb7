//! `celcontrol`: stock and sales for a phone shop.
//!
//! Manages contexts (one per store) and runs the stock operations
//! against the selected one.

mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use celcontrol_core::{ServiceError, StoreConfig};
use stock::WorkflowOptions;

use commands::{Output, Session};

/// CelControl CLI.
#[derive(Parser, Debug)]
#[command(name = "celcontrol", about = "Phone shop stock and sales")]
struct Cli {
    /// Path to client config file (default: ~/.celcontrol/config.toml).
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    /// Run against this context instead of the current one.
    #[arg(long = "context", global = true)]
    context: Option<String>,

    /// Output format.
    #[arg(long = "output", short = 'o', global = true, value_enum, default_value = "table")]
    output: Output,

    /// Log filter (e.g. "info", "stock=debug"). Overrides RUST_LOG.
    #[arg(long = "log-level", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage contexts.
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },

    /// Switch the current context.
    Use {
        #[command(subcommand)]
        what: UseWhat,
    },

    /// Stock entry and inventory.
    Device {
        #[command(subcommand)]
        action: DeviceAction,
    },

    /// Sales.
    Sale {
        #[command(subcommand)]
        action: SaleAction,
    },

    /// Export all sales as a CSV report.
    Export {
        /// Target directory.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Look for sales and device states that disagree.
    Check,

    /// Stock and sales totals.
    Summary,

    /// Check the store is reachable.
    Status,

    /// Show version.
    Version,
}

#[derive(Subcommand, Debug)]
enum ContextAction {
    /// Create a new context.
    Create {
        /// Context name.
        name: String,
        /// SQLite database file (created if missing).
        #[arg(long, conflicts_with = "url", required_unless_present = "url")]
        sqlite: Option<String>,
        /// PostgREST base URL.
        #[arg(long)]
        url: Option<String>,
        /// API key for the REST store.
        #[arg(long, requires = "url")]
        api_key: Option<String>,
        /// UTC offset in minutes for report dates.
        #[arg(long, allow_hyphen_values = true, default_value_t = config::DEFAULT_UTC_OFFSET_MINUTES)]
        utc_offset: i32,
    },
    /// List all contexts.
    List,
    /// Delete a context.
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum UseWhat {
    /// Switch to a context.
    Context { name: String },
}

#[derive(Subcommand, Debug)]
enum DeviceAction {
    /// Register a device into stock.
    Add {
        #[arg(long)]
        model: String,
        /// IMEI or serial, digits only.
        #[arg(long)]
        imei: String,
    },
    /// List devices, newest first.
    List {
        /// Filter by model or IMEI.
        #[arg(long)]
        search: Option<String>,
        /// Only devices that can still be sold.
        #[arg(long)]
        available: bool,
    },
}

#[derive(Subcommand, Debug)]
enum SaleAction {
    /// Register a sale and mark its device sold.
    Register {
        /// Device ID.
        #[arg(long)]
        device: String,
        #[arg(long)]
        client: String,
        /// 10-digit phone number.
        #[arg(long)]
        phone: String,
        /// Local, Facebook, Referido, WhatsApp.
        #[arg(long, default_value = "Local")]
        channel: String,
        #[arg(long, default_value = "")]
        down_payment: String,
        /// Skip the availability re-check before writing.
        #[arg(long)]
        no_verify: bool,
    },
    /// List sales, newest first.
    List,
    /// Mark a device sold after a partially failed sale.
    RetryStatus { device_id: String },
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into()),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());
    let output = cli.output;

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            let service_err = err.downcast_ref::<ServiceError>();
            match (output, service_err) {
                (Output::Json, Some(e)) => eprintln!("{}", e.to_json()),
                _ => eprintln!("Error: {err:#}"),
            }
            ExitCode::from(service_err.map(ServiceError::exit_code).unwrap_or(1))
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config_path = cli
        .config
        .unwrap_or_else(config::ClientConfig::default_path);
    let open = || Session::open(&config_path, cli.context.as_deref(), cli.output);

    match cli.command {
        Commands::Context { action } => match action {
            ContextAction::Create {
                name,
                sqlite,
                url,
                api_key,
                utc_offset,
            } => {
                let store = match (sqlite, url) {
                    (Some(path), _) => StoreConfig::sqlite(&path, &std::env::current_dir()?),
                    (None, Some(url)) => StoreConfig::Rest {
                        url,
                        api_key: api_key.unwrap_or_default(),
                    },
                    (None, None) => anyhow::bail!("Provide --sqlite <path> or --url <url>."),
                };
                commands::context::create(&name, store, utc_offset, &config_path)?;
            }
            ContextAction::List => commands::context::list(&config_path)?,
            ContextAction::Delete { name } => commands::context::delete(&name, &config_path)?,
        },

        Commands::Use { what } => match what {
            UseWhat::Context { name } => commands::context::use_context(&name, &config_path)?,
        },

        Commands::Device { action } => {
            let session = open()?;
            match action {
                DeviceAction::Add { model, imei } => {
                    commands::device::add(&session, &model, &imei)?
                }
                DeviceAction::List { search, available } => {
                    commands::device::list(&session, search.as_deref(), available)?
                }
            }
        }

        Commands::Sale { action } => match action {
            SaleAction::Register {
                device,
                client,
                phone,
                channel,
                down_payment,
                no_verify,
            } => {
                let session = open()?.with_options(WorkflowOptions {
                    verify_availability: !no_verify,
                });
                commands::sale::register(
                    &session,
                    commands::sale::RegisterArgs {
                        device,
                        client,
                        phone,
                        channel,
                        down_payment,
                    },
                )?;
            }
            SaleAction::List => commands::sale::list(&open()?)?,
            SaleAction::RetryStatus { device_id } => {
                commands::sale::retry_status(&open()?, &device_id)?
            }
        },

        Commands::Export { dir } => commands::report::export(&open()?, &dir)?,

        Commands::Check => {
            if !commands::report::check(&open()?)? {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Summary => commands::report::summary(&open()?)?,

        Commands::Status => commands::report::status(&open()?)?,

        Commands::Version => {
            println!("celcontrol v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(ExitCode::SUCCESS)
}
