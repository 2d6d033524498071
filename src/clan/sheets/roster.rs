//! Roster derivation from the coloured "Wars" sheet and its destination
//! rendering.

use tracing::{debug, info, instrument, warn};

use crate::clan::sheets::classify::is_active;
use crate::clan::sheets::config::SyncConfig;
use crate::clan::sheets::error::Result;
use crate::clan::sheets::io::SpreadsheetClient;
use crate::clan::sheets::model::{CellRange, CellStyle, Color, Roster, SheetGrid, SyncWarning};

/// Column whose background decides whether a row is active.
pub const COLOR_COLUMN: usize = 0;
const NAME_COLUMN: usize = 0;
const TAG_COLUMN: usize = 1;

/// Roster built from one source sheet plus the conditions recovered on the
/// way.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extraction {
    pub roster: Roster,
    pub warnings: Vec<SyncWarning>,
}

/// Result of rewriting the destination roster sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterWrite {
    pub entries: usize,
    /// Set when the header styling step failed. Data was written regardless.
    pub format_warning: Option<SyncWarning>,
}

/// Maps a row of the value grid onto the colour list, which starts at the
/// first row after the header.
pub fn color_index_for_row(row: usize, header_offset: usize) -> Option<usize> {
    row.checked_sub(header_offset)
}

/// Builds the roster from the sheet's value rows and the first-column colours
/// fetched from `header_offset` onwards.
pub fn extract_roster(
    rows: &[Vec<String>],
    colors: &[Option<Color>],
    config: &SyncConfig,
) -> Extraction {
    let mut extraction = Extraction::default();

    for (row_idx, row) in rows.iter().enumerate().skip(config.header_offset) {
        let Some((name, identifier)) = candidate(row) else {
            continue;
        };

        let color = color_index_for_row(row_idx, config.header_offset)
            .and_then(|index| colors.get(index).copied().flatten());
        if color.is_none() {
            extraction.warnings.push(SyncWarning::MissingColor { row: row_idx });
            continue;
        }
        if !is_active(color, Some(config.active_color), config.tolerance) {
            continue;
        }

        extraction
            .roster
            .insert(identifier.to_string(), name.to_string(), row_idx);
    }

    for duplicate in extraction.roster.duplicates() {
        warn!(
            tag = %duplicate.identifier,
            row = duplicate.row + 1,
            kept = %duplicate.name,
            replaced = %duplicate.replaced_name,
            "duplicate player tag, keeping the later row"
        );
        extraction
            .warnings
            .push(SyncWarning::DuplicateIdentifier(duplicate.clone()));
    }

    extraction
}

/// Returns `(name, tag)` when both leading cells hold text.
fn candidate(row: &[String]) -> Option<(&str, &str)> {
    let name = row.get(NAME_COLUMN)?.trim();
    let tag = normalize_tag(row.get(TAG_COLUMN)?);
    if name.is_empty() || tag.is_empty() {
        return None;
    }
    Some((name, tag))
}

/// Trims whitespace and the `#` players type in front of their tag. A cell
/// holding only `#` normalises to an empty tag, so its row is not a player.
fn normalize_tag(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed.strip_prefix('#').map(str::trim_start).unwrap_or(trimmed)
}

/// Reads the configured roster sheet of the source spreadsheet, values and
/// colours, and extracts the roster from it.
#[instrument(level = "info", skip(client, config), fields(sheet = %config.roster_sheet))]
pub fn read_roster<C: SpreadsheetClient + ?Sized>(
    client: &C,
    spreadsheet_id: &str,
    config: &SyncConfig,
) -> Result<Extraction> {
    let rows = client.values(spreadsheet_id, &config.roster_sheet)?;
    if rows.len() <= config.header_offset {
        debug!(rows = rows.len(), "no rows below the header");
        return Ok(Extraction::default());
    }

    let colors = client.background_colors(
        spreadsheet_id,
        &config.roster_sheet,
        CellRange::column_from(COLOR_COLUMN, config.header_offset),
    )?;
    let expected = rows.len() - config.header_offset;
    if colors.len() < expected {
        warn!(
            colors = colors.len(),
            expected,
            "colour metadata shorter than the sheet, trailing rows count as inactive"
        );
    }

    let extraction = extract_roster(&rows, &colors, config);
    info!(
        rows = rows.len(),
        players = extraction.roster.len(),
        "roster extracted"
    );
    Ok(extraction)
}

/// Replaces the destination roster sheet with a header row followed by one
/// `[tag, name]` row per player.
#[instrument(
    level = "info",
    skip(client, roster, config),
    fields(sheet = %config.roster_sheet, players = roster.len())
)]
pub fn write_roster<C: SpreadsheetClient + ?Sized>(
    client: &mut C,
    spreadsheet_id: &str,
    roster: &Roster,
    config: &SyncConfig,
) -> Result<RosterWrite> {
    let sheet = client.find_or_add_worksheet(
        spreadsheet_id,
        &config.roster_sheet,
        config.roster_capacity_rows,
        config.roster_capacity_columns,
    )?;

    client.clear(spreadsheet_id, &sheet)?;

    let header: SheetGrid = vec![config.roster_headers.to_vec()];
    client.update(spreadsheet_id, &sheet, 0, 0, &header)?;

    let rows = roster.to_rows();
    if !rows.is_empty() {
        client.update(spreadsheet_id, &sheet, 1, 0, &rows)?;
    }

    let style = CellStyle {
        bold: true,
        background: Some(config.header_background),
    };
    let format_warning = match client.format(
        spreadsheet_id,
        &sheet,
        CellRange::row(0, header[0].len()),
        style,
    ) {
        Ok(()) => None,
        Err(err) => {
            warn!(error = %err, "header formatting failed, roster data is intact");
            Some(SyncWarning::HeaderFormat {
                sheet: sheet.title.clone(),
                reason: err.to_string(),
            })
        }
    };

    Ok(RosterWrite {
        entries: rows.len(),
        format_warning,
    })
}
