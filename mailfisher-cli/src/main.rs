use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use extractors::{format_stats, monthly_totals, ExpenseParser, FilterTables, HeaderDateFallback};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

mod config;
mod helpers;
mod integrations;
mod jobs;

use config::AppConfig;
use helpers::keyring_service::KeyringService;
use integrations::eml_source::EmlDirSource;
use integrations::real_imap_client::{ImapCredentials, RealImapClient};
use integrations::MailSource;
use jobs::export_manager::{DateRange, ExportManager};

#[derive(Parser, Debug)]
#[command(author, version, about = "Extract expenses from receipt and statement emails", long_about = None)]
struct Args {
    #[arg(long, global = true)]
    log_file_path: Option<String>,

    /// Where messages are read from
    #[arg(long, global = true, value_enum, default_value_t = SourceKind::Imap)]
    source: SourceKind,

    /// Directory of .eml files, used with --source eml-dir
    #[arg(long, global = true)]
    eml_dir: Option<PathBuf>,

    /// Filter tables replacing the built-in ones
    #[arg(long, global = true)]
    filters: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    Imap,
    EmlDir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FoodService {
    UberEats,
    BoltFood,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TransportService {
    Bolt,
    Uber,
    All,
}

#[derive(clap::Args, Debug, Clone, Default)]
struct SelectionArgs {
    /// Override the provider's sender address
    #[arg(long)]
    sender_email: Option<String>,

    /// Override the provider's search keywords
    #[arg(long)]
    keywords: Option<String>,

    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Day after the last one to include (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<NaiveDate>,
}

impl SelectionArgs {
    fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }

    fn apply(&self, parser: ExpenseParser) -> ExpenseParser {
        parser.with_selection(self.sender_email.clone(), self.keywords.clone())
    }
}

#[derive(clap::Args, Debug, Clone, Default)]
struct OutputArgs {
    /// JSON file to write, defaults to <output.directory>/<command>_expenses.json
    #[arg(long)]
    output_filepath: Option<PathBuf>,

    /// Upload the export to the configured object storage
    #[arg(long)]
    upload: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export food delivery orders
    Food {
        #[arg(long, value_enum, default_value_t = FoodService::All)]
        service: FoodService,
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Export ride-hailing trips
    Transport {
        #[arg(long, value_enum, default_value_t = TransportService::All)]
        service: TransportService,
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Export bank statement transactions
    Bank {
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print id, date and subject of matching messages
    List {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Save PDF attachments of matching messages
    Attachments {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Defaults to <output.directory>/attachments
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Print monthly food delivery totals
    Stats {
        #[arg(long, value_enum, default_value_t = FoodService::UberEats)]
        service: FoodService,
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Store the IMAP password (read from stdin) in the OS keychain
    SetPassword,
}

fn init_tracing(log_file_path: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = log_file_path {
        let log_path = std::path::Path::new(log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("mailfisher.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn imap_username(config: &AppConfig) -> Result<String> {
    config
        .imap
        .username
        .clone()
        .context("imap.username is not configured (or set MAILFISHER_IMAP__USERNAME)")
}

async fn build_source(args: &Args, config: &AppConfig) -> Result<Arc<dyn MailSource>> {
    match args.source {
        SourceKind::EmlDir => {
            let dir = args
                .eml_dir
                .clone()
                .context("--eml-dir is required with --source eml-dir")?;
            Ok(Arc::new(EmlDirSource::new(dir)?))
        }
        SourceKind::Imap => {
            let username = imap_username(config)?;
            let password = match &config.imap.password {
                Some(password) => password.clone(),
                None => KeyringService::get_password(&config.imap.host, &username)
                    .context("No IMAP password in config or keychain, run `mailfisher set-password`")?,
            };

            let credentials = ImapCredentials {
                host: config.imap.host.clone(),
                port: config.imap.port,
                username,
                password,
                mailbox: config.imap.mailbox.clone(),
            };
            let client =
                tokio::task::spawn_blocking(move || RealImapClient::connect_with_password(credentials))
                    .await
                    .context("IMAP connect task failed")??;
            Ok(Arc::new(client))
        }
    }
}

fn food_parsers(
    service: FoodService,
    tables: &FilterTables,
    date_fallback: HeaderDateFallback,
) -> Vec<ExpenseParser> {
    match service {
        FoodService::BoltFood => vec![ExpenseParser::bolt_food(tables)],
        FoodService::UberEats => vec![ExpenseParser::uber_eats(tables, date_fallback)],
        FoodService::All => vec![
            ExpenseParser::bolt_food(tables),
            ExpenseParser::uber_eats(tables, date_fallback),
        ],
    }
}

fn output_path(config: &AppConfig, output: &OutputArgs, name: &str) -> PathBuf {
    output
        .output_filepath
        .clone()
        .unwrap_or_else(|| config.output.directory.join(format!("{}_expenses.json", name)))
}

async fn run_export(
    manager: &ExportManager,
    parsers: Vec<ExpenseParser>,
    selection: &SelectionArgs,
    output: &OutputArgs,
    output_path: PathBuf,
) -> Result<()> {
    let parsers: Vec<ExpenseParser> = parsers.into_iter().map(|p| selection.apply(p)).collect();
    let summary = manager
        .export(&parsers, selection.range(), output_path, output.upload)
        .await?;

    tracing::info!(
        "Exported {} records to {:?} ({} messages skipped)",
        summary.records,
        summary.output_path,
        summary.skipped
    );
    if let Some(url) = &summary.uploaded_to {
        tracing::info!("Export available at {}", url);
    }
    println!("{}", summary.output_path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file_path.as_deref());

    let (config, config_path) = AppConfig::load().context("Failed to load config")?;
    tracing::info!("Using config at {:?}", config_path);

    if let Command::SetPassword = args.command {
        let username = imap_username(&config)?;
        let mut password = String::new();
        std::io::stdin()
            .read_line(&mut password)
            .context("Failed to read password from stdin")?;
        KeyringService::set_password(&config.imap.host, &username, password.trim())?;
        tracing::info!("Stored IMAP password for {} in the keychain", username);
        return Ok(());
    }

    let filters_path = args
        .filters
        .clone()
        .or_else(|| config.extraction.filters_path.clone());
    let tables = FilterTables::load_or_builtin(filters_path.as_deref())?;
    let date_fallback = config.extraction.header_date_fallback;

    let source = build_source(&args, &config).await?;
    let manager = ExportManager::new(source, config.fetch.clone(), config.storage.clone());

    match &args.command {
        Command::Food {
            service,
            selection,
            output,
        } => {
            let parsers = food_parsers(*service, &tables, date_fallback);
            let path = output_path(&config, output, "food");
            run_export(&manager, parsers, selection, output, path).await?;
        }
        Command::Transport {
            service,
            selection,
            output,
        } => {
            let parsers = match service {
                TransportService::Bolt => vec![ExpenseParser::bolt_ride()],
                TransportService::Uber => vec![ExpenseParser::uber_ride()],
                TransportService::All => vec![ExpenseParser::bolt_ride(), ExpenseParser::uber_ride()],
            };
            let path = output_path(&config, output, "transport");
            run_export(&manager, parsers, selection, output, path).await?;
        }
        Command::Bank { selection, output } => {
            let path = output_path(&config, output, "bank");
            run_export(
                &manager,
                vec![ExpenseParser::banco_ctt(&tables)],
                selection,
                output,
                path,
            )
            .await?;
        }
        Command::List { selection } => {
            let messages = manager
                .fetch_matching(
                    selection.sender_email.as_deref().unwrap_or_default(),
                    selection.keywords.as_deref().unwrap_or_default(),
                    false,
                    selection.range(),
                )
                .await?;
            for line in jobs::message_list::format_listing(&messages) {
                println!("{}", line);
            }
        }
        Command::Attachments {
            selection,
            output_dir,
        } => {
            let messages = manager
                .fetch_matching(
                    selection.sender_email.as_deref().unwrap_or_default(),
                    selection.keywords.as_deref().unwrap_or_default(),
                    true,
                    selection.range(),
                )
                .await?;
            let output_dir = output_dir
                .clone()
                .unwrap_or_else(|| config.output.directory.join("attachments"));
            let saved = jobs::attachment_manager::save_pdf_attachments(&messages, &output_dir)?;
            tracing::info!("Saved {} attachments to {:?}", saved.len(), output_dir);
        }
        Command::Stats { service, selection } => {
            let parsers: Vec<ExpenseParser> = food_parsers(*service, &tables, date_fallback)
                .into_iter()
                .map(|p| selection.apply(p))
                .collect();
            let (records, skipped) = manager.collect(&parsers, selection.range()).await?;
            tracing::info!("Computing stats over {} records ({} messages skipped)", records.len(), skipped);
            for line in format_stats(&monthly_totals(&records)) {
                println!("{}", line);
            }
        }
        Command::SetPassword => {}
    }

    Ok(())
}
