//! Spreadsheet backends. [`SpreadsheetClient`] is the seam between the sync
//! pipeline and whatever stores the cells.

pub mod excel_read;
pub mod excel_write;
pub mod google;
pub mod memory;

use crate::clan::sheets::error::{Result, SyncError};
use crate::clan::sheets::model::{CellRange, CellStyle, Color, SheetGrid, Worksheet};

/// Access to a set of spreadsheets addressed by id.
///
/// Read operations take `&self`; anything that mutates a spreadsheet takes
/// `&mut self`. Row and column indices are zero-based throughout.
pub trait SpreadsheetClient {
    /// Checks the spreadsheet can be opened and returns its title. Fails with
    /// [`SyncError::Access`] when it cannot.
    fn open(&self, spreadsheet_id: &str) -> Result<String>;

    /// Lists worksheets in the spreadsheet's native order.
    fn worksheets(&self, spreadsheet_id: &str) -> Result<Vec<Worksheet>>;

    /// Returns every cell value of a worksheet.
    fn values(&self, spreadsheet_id: &str, title: &str) -> Result<SheetGrid>;

    /// Returns the background colour of the first column of `range`, one
    /// entry per row starting at `range.start_row`. The list may be shorter
    /// than the rows of the sheet, and entries are `None` where the provider
    /// reported no colour.
    fn background_colors(
        &self,
        spreadsheet_id: &str,
        title: &str,
        range: CellRange,
    ) -> Result<Vec<Option<Color>>>;

    /// Creates a worksheet with the given capacity.
    fn add_worksheet(
        &mut self,
        spreadsheet_id: &str,
        title: &str,
        rows: usize,
        columns: usize,
    ) -> Result<Worksheet>;

    /// Removes every value of a worksheet.
    fn clear(&mut self, spreadsheet_id: &str, sheet: &Worksheet) -> Result<()>;

    /// Writes `values` with their top-left corner at (`row`, `column`),
    /// without interpreting them.
    fn update(
        &mut self,
        spreadsheet_id: &str,
        sheet: &Worksheet,
        row: usize,
        column: usize,
        values: &SheetGrid,
    ) -> Result<()>;

    /// Applies a cosmetic style to a range.
    fn format(
        &mut self,
        spreadsheet_id: &str,
        sheet: &Worksheet,
        range: CellRange,
        style: CellStyle,
    ) -> Result<()>;

    /// Looks a worksheet up by exact title.
    fn find_worksheet(&self, spreadsheet_id: &str, title: &str) -> Result<Worksheet> {
        self.worksheets(spreadsheet_id)?
            .into_iter()
            .find(|sheet| sheet.title == title)
            .ok_or_else(|| SyncError::SheetMissing(title.to_string()))
    }

    /// Looks a worksheet up by title, creating it with the given capacity when
    /// it does not exist yet.
    fn find_or_add_worksheet(
        &mut self,
        spreadsheet_id: &str,
        title: &str,
        rows: usize,
        columns: usize,
    ) -> Result<Worksheet> {
        match self.find_worksheet(spreadsheet_id, title) {
            Ok(sheet) => Ok(sheet),
            Err(SyncError::SheetMissing(_)) => {
                tracing::info!(sheet = title, rows, columns, "creating missing destination sheet");
                self.add_worksheet(spreadsheet_id, title, rows, columns)
            }
            Err(other) => Err(other),
        }
    }
}
