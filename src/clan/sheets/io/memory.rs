//! In-process spreadsheets used for dry runs, offline sources and tests.

use std::collections::{BTreeMap, BTreeSet};

use crate::clan::sheets::error::{Result, SyncError};
use crate::clan::sheets::io::SpreadsheetClient;
use crate::clan::sheets::model::{CellRange, CellStyle, Color, SheetGrid, Worksheet};

/// A mutating call received by a [`MemoryClient`], in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCall {
    AddWorksheet { title: String, rows: usize, columns: usize },
    Clear { title: String },
    Update { title: String, row: usize, column: usize, rows: usize },
    Format { title: String, range: CellRange, style: CellStyle },
}

#[derive(Debug, Clone)]
struct MemorySheet {
    info: Worksheet,
    cells: SheetGrid,
    backgrounds: BTreeMap<(usize, usize), Color>,
    styles: Vec<(CellRange, CellStyle)>,
    color_row_limit: Option<usize>,
}

#[derive(Debug, Clone, Default)]
struct MemorySpreadsheet {
    title: String,
    sheets: Vec<MemorySheet>,
    colors_unavailable: bool,
}

/// Spreadsheet store held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryClient {
    spreadsheets: BTreeMap<String, MemorySpreadsheet>,
    failing_writes: BTreeSet<(String, String)>,
    failing_formats: BTreeSet<(String, String)>,
    calls: Vec<ClientCall>,
    next_sheet_id: u64,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an empty spreadsheet under `spreadsheet_id`.
    pub fn create_spreadsheet(&mut self, spreadsheet_id: &str, title: &str) {
        self.spreadsheets
            .entry(spreadsheet_id.to_string())
            .or_insert_with(|| MemorySpreadsheet {
                title: title.to_string(),
                sheets: Vec::new(),
                colors_unavailable: false,
            });
    }

    /// Adds or replaces a sheet holding `grid`, without recording a call.
    pub fn seed_sheet(&mut self, spreadsheet_id: &str, title: &str, grid: SheetGrid) {
        self.create_spreadsheet(spreadsheet_id, spreadsheet_id);
        let sheet_id = self.allocate_sheet_id();
        let Some(spreadsheet) = self.spreadsheets.get_mut(spreadsheet_id) else {
            return;
        };
        let rows = grid.len().max(1);
        let columns = grid.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let sheet = MemorySheet {
            info: Worksheet {
                sheet_id,
                title: title.to_string(),
                row_count: rows,
                column_count: columns,
            },
            cells: grid,
            backgrounds: BTreeMap::new(),
            styles: Vec::new(),
            color_row_limit: None,
        };
        match spreadsheet.sheets.iter_mut().find(|s| s.info.title == title) {
            Some(existing) => *existing = sheet,
            None => spreadsheet.sheets.push(sheet),
        }
    }

    /// Sets the background of one cell.
    pub fn set_background(
        &mut self,
        spreadsheet_id: &str,
        title: &str,
        row: usize,
        column: usize,
        color: Color,
    ) {
        if let Some(sheet) = self.sheet_mut(spreadsheet_id, title) {
            sheet.backgrounds.insert((row, column), color);
        }
    }

    /// Makes colour lookups on the sheet return at most `rows` entries, the
    /// way the provider omits trailing rows.
    pub fn limit_color_rows(&mut self, spreadsheet_id: &str, title: &str, rows: usize) {
        if let Some(sheet) = self.sheet_mut(spreadsheet_id, title) {
            sheet.color_row_limit = Some(rows);
        }
    }

    /// Makes colour lookups on every sheet of the spreadsheet fail, for
    /// sources that never carried cell formatting.
    pub fn mark_colors_unavailable(&mut self, spreadsheet_id: &str) {
        if let Some(spreadsheet) = self.spreadsheets.get_mut(spreadsheet_id) {
            spreadsheet.colors_unavailable = true;
        }
    }

    /// Makes every create, clear and update on the sheet fail.
    pub fn fail_writes(&mut self, spreadsheet_id: &str, title: &str) {
        self.failing_writes
            .insert((spreadsheet_id.to_string(), title.to_string()));
    }

    /// Makes formatting on the sheet fail.
    pub fn fail_formatting(&mut self, spreadsheet_id: &str, title: &str) {
        self.failing_formats
            .insert((spreadsheet_id.to_string(), title.to_string()));
    }

    /// Mutating calls received so far.
    pub fn calls(&self) -> &[ClientCall] {
        &self.calls
    }

    /// Current worksheet handle, including capacity.
    pub fn worksheet(&self, spreadsheet_id: &str, title: &str) -> Option<&Worksheet> {
        self.sheet(spreadsheet_id, title).map(|sheet| &sheet.info)
    }

    /// Styles applied to the sheet so far.
    pub fn styles(&self, spreadsheet_id: &str, title: &str) -> Vec<(CellRange, CellStyle)> {
        self.sheet(spreadsheet_id, title)
            .map(|sheet| sheet.styles.clone())
            .unwrap_or_default()
    }

    /// Every sheet of a spreadsheet with its values, in sheet order.
    pub fn export(&self, spreadsheet_id: &str) -> Vec<(String, SheetGrid)> {
        self.spreadsheets
            .get(spreadsheet_id)
            .map(|spreadsheet| {
                spreadsheet
                    .sheets
                    .iter()
                    .map(|sheet| (sheet.info.title.clone(), sheet.cells.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn allocate_sheet_id(&mut self) -> u64 {
        self.next_sheet_id += 1;
        self.next_sheet_id
    }

    fn spreadsheet(&self, spreadsheet_id: &str) -> Result<&MemorySpreadsheet> {
        self.spreadsheets
            .get(spreadsheet_id)
            .ok_or_else(|| SyncError::Access {
                spreadsheet: spreadsheet_id.to_string(),
                reason: "spreadsheet not found".into(),
            })
    }

    fn sheet(&self, spreadsheet_id: &str, title: &str) -> Option<&MemorySheet> {
        self.spreadsheets
            .get(spreadsheet_id)?
            .sheets
            .iter()
            .find(|sheet| sheet.info.title == title)
    }

    fn sheet_mut(&mut self, spreadsheet_id: &str, title: &str) -> Option<&mut MemorySheet> {
        self.spreadsheets
            .get_mut(spreadsheet_id)?
            .sheets
            .iter_mut()
            .find(|sheet| sheet.info.title == title)
    }

    fn writable_sheet(&mut self, spreadsheet_id: &str, title: &str) -> Result<&mut MemorySheet> {
        if self
            .failing_writes
            .contains(&(spreadsheet_id.to_string(), title.to_string()))
        {
            return Err(SyncError::write(title, "write rejected"));
        }
        self.sheet_mut(spreadsheet_id, title)
            .ok_or_else(|| SyncError::SheetMissing(title.to_string()))
    }
}

impl SpreadsheetClient for MemoryClient {
    fn open(&self, spreadsheet_id: &str) -> Result<String> {
        Ok(self.spreadsheet(spreadsheet_id)?.title.clone())
    }

    fn worksheets(&self, spreadsheet_id: &str) -> Result<Vec<Worksheet>> {
        Ok(self
            .spreadsheet(spreadsheet_id)?
            .sheets
            .iter()
            .map(|sheet| sheet.info.clone())
            .collect())
    }

    fn values(&self, spreadsheet_id: &str, title: &str) -> Result<SheetGrid> {
        self.spreadsheet(spreadsheet_id)?;
        self.sheet(spreadsheet_id, title)
            .map(|sheet| sheet.cells.clone())
            .ok_or_else(|| SyncError::SheetMissing(title.to_string()))
    }

    fn background_colors(
        &self,
        spreadsheet_id: &str,
        title: &str,
        range: CellRange,
    ) -> Result<Vec<Option<Color>>> {
        if self.spreadsheet(spreadsheet_id)?.colors_unavailable {
            return Err(SyncError::ColorsUnavailable(title.to_string()));
        }
        let sheet = self
            .sheet(spreadsheet_id, title)
            .ok_or_else(|| SyncError::SheetMissing(title.to_string()))?;
        let last_row = range.end_row.unwrap_or(sheet.cells.len());
        let mut colors: Vec<Option<Color>> = (range.start_row..last_row)
            .map(|row| sheet.backgrounds.get(&(row, range.start_column)).copied())
            .collect();
        if let Some(limit) = sheet.color_row_limit {
            colors.truncate(limit);
        }
        Ok(colors)
    }

    fn add_worksheet(
        &mut self,
        spreadsheet_id: &str,
        title: &str,
        rows: usize,
        columns: usize,
    ) -> Result<Worksheet> {
        self.spreadsheet(spreadsheet_id)?;
        if self
            .failing_writes
            .contains(&(spreadsheet_id.to_string(), title.to_string()))
        {
            return Err(SyncError::write(title, "sheet creation rejected"));
        }
        if self.sheet(spreadsheet_id, title).is_some() {
            return Err(SyncError::write(title, "a sheet with this title already exists"));
        }
        self.calls.push(ClientCall::AddWorksheet {
            title: title.to_string(),
            rows,
            columns,
        });
        let info = Worksheet {
            sheet_id: self.allocate_sheet_id(),
            title: title.to_string(),
            row_count: rows,
            column_count: columns,
        };
        if let Some(spreadsheet) = self.spreadsheets.get_mut(spreadsheet_id) {
            spreadsheet.sheets.push(MemorySheet {
                info: info.clone(),
                cells: Vec::new(),
                backgrounds: BTreeMap::new(),
                styles: Vec::new(),
                color_row_limit: None,
            });
        }
        Ok(info)
    }

    fn clear(&mut self, spreadsheet_id: &str, sheet: &Worksheet) -> Result<()> {
        let target = self.writable_sheet(spreadsheet_id, &sheet.title)?;
        target.cells.clear();
        self.calls.push(ClientCall::Clear {
            title: sheet.title.clone(),
        });
        Ok(())
    }

    fn update(
        &mut self,
        spreadsheet_id: &str,
        sheet: &Worksheet,
        row: usize,
        column: usize,
        values: &SheetGrid,
    ) -> Result<()> {
        let target = self.writable_sheet(spreadsheet_id, &sheet.title)?;
        for (offset, source_row) in values.iter().enumerate() {
            let row_index = row + offset;
            if target.cells.len() <= row_index {
                target.cells.resize_with(row_index + 1, Vec::new);
            }
            let cells = &mut target.cells[row_index];
            let needed = column + source_row.len();
            if cells.len() < needed {
                cells.resize(needed, String::new());
            }
            cells[column..needed].clone_from_slice(source_row);
        }
        let width = target.cells.iter().map(Vec::len).max().unwrap_or(0);
        target.info.row_count = target.info.row_count.max(target.cells.len());
        target.info.column_count = target.info.column_count.max(width);
        self.calls.push(ClientCall::Update {
            title: sheet.title.clone(),
            row,
            column,
            rows: values.len(),
        });
        Ok(())
    }

    fn format(
        &mut self,
        spreadsheet_id: &str,
        sheet: &Worksheet,
        range: CellRange,
        style: CellStyle,
    ) -> Result<()> {
        self.calls.push(ClientCall::Format {
            title: sheet.title.clone(),
            range,
            style,
        });
        if self
            .failing_formats
            .contains(&(spreadsheet_id.to_string(), sheet.title.clone()))
        {
            return Err(SyncError::FormatApply {
                sheet: sheet.title.clone(),
                reason: "formatting rejected".into(),
            });
        }
        let target = self
            .sheet_mut(spreadsheet_id, &sheet.title)
            .ok_or_else(|| SyncError::SheetMissing(sheet.title.clone()))?;
        target.styles.push((range, style));
        Ok(())
    }
}
