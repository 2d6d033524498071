use tracing::{error, info, instrument, warn};

use crate::clan::sheets::config::SyncConfig;
use crate::clan::sheets::error::{Result, SyncError};
use crate::clan::sheets::io::SpreadsheetClient;
use crate::clan::sheets::mirror::mirror_sheet;
use crate::clan::sheets::model::{SheetOutcome, SheetRole, SheetStatus, SyncReport, SyncWarning};
use crate::clan::sheets::roster::{read_roster, write_roster};

/// Synchronises every sheet of the source spreadsheet into the destination.
///
/// The roster sheet is rebuilt from its active rows; every other sheet is
/// mirrored verbatim. Failures are recorded per sheet and never stop the
/// run. Only an unreachable spreadsheet aborts, before anything is written.
#[instrument(
    level = "info",
    skip_all,
    fields(source = %source_id, destination = %destination_id)
)]
pub fn run<S, D>(
    source: &S,
    source_id: &str,
    destination: &mut D,
    destination_id: &str,
    config: &SyncConfig,
) -> Result<SyncReport>
where
    S: SpreadsheetClient + ?Sized,
    D: SpreadsheetClient + ?Sized,
{
    let source_title = source.open(source_id)?;
    info!(title = %source_title, "source spreadsheet opened");
    let destination_title = destination.open(destination_id)?;
    info!(title = %destination_title, "destination spreadsheet opened");

    let sheets = source
        .worksheets(source_id)
        .map_err(|err| SyncError::Access {
            spreadsheet: source_id.to_string(),
            reason: err.to_string(),
        })?;
    let mut report = SyncReport::default();

    for sheet in sheets {
        let role = SheetRole::for_title(&sheet.title, &config.roster_sheet);
        let status = match role {
            SheetRole::RosterSource => sync_roster(
                source,
                source_id,
                destination,
                destination_id,
                config,
                &mut report.warnings,
            ),
            SheetRole::Mirror => {
                sync_mirror(source, source_id, destination, destination_id, &sheet.title)
            }
        };

        match &status {
            SheetStatus::Failed { reason } => {
                error!(sheet = %sheet.title, %reason, "sheet sync failed");
            }
            other => info!(sheet = %sheet.title, status = ?other, "sheet synced"),
        }
        report.sheets.push(SheetOutcome {
            title: sheet.title,
            status,
        });
    }

    if report.has_failures() {
        warn!(
            failed = report.failures().count(),
            total = report.sheets.len(),
            "run finished with failures"
        );
    }
    Ok(report)
}

fn sync_mirror<S, D>(
    source: &S,
    source_id: &str,
    destination: &mut D,
    destination_id: &str,
    title: &str,
) -> SheetStatus
where
    S: SpreadsheetClient + ?Sized,
    D: SpreadsheetClient + ?Sized,
{
    let outcome = source.values(source_id, title).and_then(|grid| {
        mirror_sheet(destination, destination_id, title, &grid).map(|_| grid.len())
    });
    match outcome {
        Ok(rows) => SheetStatus::Mirrored { rows },
        Err(err) => SheetStatus::Failed {
            reason: err.to_string(),
        },
    }
}

fn sync_roster<S, D>(
    source: &S,
    source_id: &str,
    destination: &mut D,
    destination_id: &str,
    config: &SyncConfig,
    warnings: &mut Vec<SyncWarning>,
) -> SheetStatus
where
    S: SpreadsheetClient + ?Sized,
    D: SpreadsheetClient + ?Sized,
{
    let extraction = match read_roster(source, source_id, config) {
        Ok(extraction) => extraction,
        Err(err) => {
            return SheetStatus::Failed {
                reason: err.to_string(),
            };
        }
    };
    warnings.extend(extraction.warnings);

    match write_roster(destination, destination_id, &extraction.roster, config) {
        Ok(write) => {
            warnings.extend(write.format_warning);
            SheetStatus::RosterSynced {
                entries: write.entries,
            }
        }
        Err(err) => SheetStatus::Failed {
            reason: err.to_string(),
        },
    }
}
