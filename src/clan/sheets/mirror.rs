use tracing::{debug, instrument};

use crate::clan::sheets::error::Result;
use crate::clan::sheets::io::SpreadsheetClient;
use crate::clan::sheets::model::{SheetGrid, Worksheet};

/// Replaces the content of the destination sheet titled `title` with `grid`,
/// creating the sheet when it does not exist. The sheet is always cleared
/// first so no cell of a previous, larger grid survives.
#[instrument(level = "info", skip(client, grid), fields(rows = grid.len()))]
pub fn mirror_sheet<C: SpreadsheetClient + ?Sized>(
    client: &mut C,
    spreadsheet_id: &str,
    title: &str,
    grid: &SheetGrid,
) -> Result<Worksheet> {
    let (rows, columns) = creation_size(grid);
    let sheet = client.find_or_add_worksheet(spreadsheet_id, title, rows, columns)?;

    client.clear(spreadsheet_id, &sheet)?;
    if grid.is_empty() {
        debug!("source sheet is empty, destination left cleared");
        return Ok(sheet);
    }

    client.update(spreadsheet_id, &sheet, 0, 0, grid)?;
    Ok(sheet)
}

/// Capacity of a newly created mirror: the grid's extent, never below 1x1.
pub fn creation_size(grid: &SheetGrid) -> (usize, usize) {
    let rows = grid.len().max(1);
    let columns = grid.iter().map(Vec::len).max().unwrap_or(0).max(1);
    (rows, columns)
}
