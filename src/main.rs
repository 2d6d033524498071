use std::path::{Path, PathBuf};
use std::time::Duration;

use clan_sheets::config::SyncConfig;
use clan_sheets::io::excel_write::{self, SnapshotSheet};
use clan_sheets::io::google::GoogleSheetsClient;
use clan_sheets::io::memory::MemoryClient;
use clan_sheets::io::{SpreadsheetClient, excel_read};
use clan_sheets::model::{CellStyle, SheetStatus, SyncReport};
use clan_sheets::{Result, SyncError, sync};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DRY_RUN_SPREADSHEET: &str = "dry-run";
const OFFLINE_SOURCE: &str = "source-file";

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| SyncError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Sync(args) => execute_sync(args),
        Command::Snapshot(args) => execute_snapshot(args).map(|()| 0),
    }
}

fn execute_sync(args: SyncArgs) -> Result<i32> {
    let config = match &args.config {
        Some(path) => SyncConfig::from_path(path)?,
        None => SyncConfig::default(),
    };
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let (source, source_id) = open_source(&args, timeout)?;

    let report = match (&args.dry_run, &args.destination) {
        (Some(output), _) => {
            let mut destination = MemoryClient::new();
            destination.create_spreadsheet(DRY_RUN_SPREADSHEET, "Dry run");
            let report = sync::run(
                source.as_ref(),
                &source_id,
                &mut destination,
                DRY_RUN_SPREADSHEET,
                &config,
            )?;
            export_dry_run(&destination, output, &config)?;
            report
        }
        (None, Some(destination_id)) => {
            let mut destination = google_client(args.token.as_deref(), timeout)?;
            sync::run(
                source.as_ref(),
                &source_id,
                &mut destination,
                destination_id,
                &config,
            )?
        }
        (None, None) => {
            return Err(SyncError::InvalidConfig(
                "either --destination or --dry-run is required".into(),
            ));
        }
    };

    print_report(&report);
    Ok(if report.has_failures() { 2 } else { 0 })
}

fn open_source(args: &SyncArgs, timeout: Duration) -> Result<(Box<dyn SpreadsheetClient>, String)> {
    if let Some(path) = &args.source_file {
        let mut client = MemoryClient::new();
        excel_read::load_into(&mut client, OFFLINE_SOURCE, path)?;
        let client: Box<dyn SpreadsheetClient> = Box::new(client);
        return Ok((client, OFFLINE_SOURCE.to_string()));
    }
    let Some(id) = &args.source else {
        return Err(SyncError::InvalidConfig(
            "either --source or --source-file is required".into(),
        ));
    };
    let client: Box<dyn SpreadsheetClient> = Box::new(google_client(args.token.as_deref(), timeout)?);
    Ok((client, id.clone()))
}

fn execute_snapshot(args: SnapshotArgs) -> Result<()> {
    let client = google_client(args.token.as_deref(), Duration::from_secs(args.timeout_secs))?;
    let title = client.open(&args.spreadsheet)?;
    let mut sheets = Vec::new();
    for worksheet in client.worksheets(&args.spreadsheet)? {
        let rows = client.values(&args.spreadsheet, &worksheet.title)?;
        sheets.push(SnapshotSheet {
            title: worksheet.title,
            rows,
            header_style: None,
        });
    }
    let names = excel_write::write_workbook(&args.output, &sheets)?;
    info!(
        spreadsheet = %title,
        sheets = names.len(),
        output = %args.output.display(),
        "snapshot written"
    );
    Ok(())
}

fn export_dry_run(destination: &MemoryClient, output: &Path, config: &SyncConfig) -> Result<()> {
    let sheets: Vec<SnapshotSheet> = destination
        .export(DRY_RUN_SPREADSHEET)
        .into_iter()
        .map(|(title, rows)| {
            let header_style = (title == config.roster_sheet).then_some(CellStyle {
                bold: true,
                background: Some(config.header_background),
            });
            SnapshotSheet {
                title,
                rows,
                header_style,
            }
        })
        .collect();
    excel_write::write_workbook(output, &sheets)?;
    info!(output = %output.display(), sheets = sheets.len(), "dry run written");
    Ok(())
}

fn google_client(token: Option<&str>, timeout: Duration) -> Result<GoogleSheetsClient> {
    let token = token.ok_or_else(|| {
        SyncError::InvalidConfig("an access token is required (--token or CLAN_SHEETS_TOKEN)".into())
    })?;
    GoogleSheetsClient::new(token, timeout)
}

fn print_report(report: &SyncReport) {
    for outcome in &report.sheets {
        match &outcome.status {
            SheetStatus::Mirrored { rows } => println!("mirrored  {} ({rows} rows)", outcome.title),
            SheetStatus::RosterSynced { entries } => {
                println!("roster    {} ({entries} players)", outcome.title)
            }
            SheetStatus::Failed { reason } => println!("failed    {}: {reason}", outcome.title),
        }
    }
    for warning in &report.warnings {
        println!("warning   {warning}");
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Mirror a clan spreadsheet and rebuild its war roster."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy every source sheet into the destination spreadsheet.
    Sync(SyncArgs),
    /// Export every sheet of a spreadsheet to an xlsx workbook.
    Snapshot(SnapshotArgs),
}

#[derive(Args)]
struct SyncArgs {
    /// Source spreadsheet id. Ignored when --source-file is given.
    #[arg(long, env = "CLAN_SHEETS_SOURCE")]
    source: Option<String>,

    /// Read the source from a local xlsx workbook instead. Cell colours are
    /// not available, so the roster sheet is reported failed and left as is.
    #[arg(long)]
    source_file: Option<PathBuf>,

    /// Destination spreadsheet id. Ignored when --dry-run is given.
    #[arg(long, env = "CLAN_SHEETS_DESTINATION")]
    destination: Option<String>,

    /// Sync into memory and write the would-be destination to this xlsx file.
    #[arg(long, value_name = "OUTPUT")]
    dry_run: Option<PathBuf>,

    /// OAuth2 access token for the spreadsheet API.
    #[arg(long, env = "CLAN_SHEETS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// JSON file overriding the sync defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct SnapshotArgs {
    /// Spreadsheet id to export.
    #[arg(long)]
    spreadsheet: String,

    /// Output xlsx path.
    #[arg(long)]
    output: PathBuf,

    /// OAuth2 access token for the spreadsheet API.
    #[arg(long, env = "CLAN_SHEETS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}
