use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};

use crate::clan::sheets::error::{Result, SyncError};
use crate::clan::sheets::io::memory::MemoryClient;
use crate::clan::sheets::model::SheetGrid;

/// Reads every sheet of an xlsx workbook as raw text grids, in workbook order.
pub fn read_workbook(path: &Path) -> Result<Vec<(String, SheetGrid)>> {
    if !path.exists() {
        return Err(SyncError::MissingInput(path.to_path_buf()));
    }
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let names: Vec<String> = workbook.sheet_names().to_vec();

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let grid = match workbook.worksheet_range(&name) {
            Some(range) => range_to_grid(&range?),
            None => Vec::new(),
        };
        sheets.push((name, grid));
    }
    Ok(sheets)
}

/// Loads an xlsx workbook into an in-memory spreadsheet registered as
/// `spreadsheet_id`. Cell colours are not read, so colour lookups on the
/// loaded spreadsheet fail instead of reporting every row uncoloured.
pub fn load_into(client: &mut MemoryClient, spreadsheet_id: &str, path: &Path) -> Result<()> {
    let title = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| spreadsheet_id.to_string());
    client.create_spreadsheet(spreadsheet_id, &title);
    for (name, grid) in read_workbook(path)? {
        client.seed_sheet(spreadsheet_id, &name, grid);
    }
    client.mark_colors_unavailable(spreadsheet_id);
    Ok(())
}

fn range_to_grid(range: &calamine::Range<DataType>) -> SheetGrid {
    // Ranges start at the first used cell; pad back to A1 so positions hold.
    let (start_row, start_col) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));

    let mut grid: SheetGrid = vec![Vec::new(); start_row];
    for row in range.rows() {
        let mut cells = vec![String::new(); start_col];
        cells.extend(row.iter().map(|cell| cell_to_string(Some(cell))));
        grid.push(cells);
    }
    grid
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
