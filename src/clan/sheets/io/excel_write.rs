use std::collections::HashSet;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};

use crate::clan::sheets::error::Result;
use crate::clan::sheets::model::{CellStyle, SheetGrid};

/// A sheet to be written, with an optional style for its first row.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSheet {
    pub title: String,
    pub rows: SheetGrid,
    pub header_style: Option<CellStyle>,
}

/// Writes the provided sheets to an xlsx workbook at `path`. Titles are
/// adapted to xlsx naming rules; the returned list holds the names used.
pub fn write_workbook(path: &Path, sheets: &[SnapshotSheet]) -> Result<Vec<String>> {
    let mut workbook = Workbook::new();
    let mut names = SheetNameRegistry::default();
    let mut used = Vec::with_capacity(sheets.len());

    for sheet in sheets {
        let name = names.assign(&sheet.title);
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&name)?;

        let first_row_format = sheet.header_style.map(header_format);
        for (row_idx, row) in sheet.rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                match (&first_row_format, row_idx) {
                    (Some(format), 0) => {
                        worksheet.write_string_with_format(0, col_idx as u16, cell, format)?;
                    }
                    _ => {
                        worksheet.write_string(row_idx as u32, col_idx as u16, cell)?;
                    }
                }
            }
        }
        used.push(name);
    }

    if sheets.is_empty() {
        // xlsx files need at least one sheet.
        workbook.add_worksheet();
    }

    workbook.save(path)?;
    Ok(used)
}

fn header_format(style: CellStyle) -> Format {
    let mut format = Format::new();
    if style.bold {
        format = format.set_bold();
    }
    if let Some(background) = style.background {
        format = format.set_background_color(background.to_rgb_hex());
    }
    format
}

#[derive(Debug, Default)]
struct SheetNameRegistry {
    used: HashSet<String>,
}

impl SheetNameRegistry {
    fn assign(&mut self, raw: &str) -> String {
        let base = sanitize_sheet_name(raw);
        if self.used.insert(base.to_lowercase()) {
            return base;
        }

        let mut counter = 1;
        loop {
            let suffix = format!("_{counter}");
            let max_len = 31 - suffix.chars().count();
            let prefix: String = base.chars().take(max_len).collect();
            let candidate = format!("{prefix}{suffix}");
            if self.used.insert(candidate.to_lowercase()) {
                return candidate;
            }
            counter += 1;
        }
    }
}

fn sanitize_sheet_name(raw: &str) -> String {
    let invalid = [':', '\\', '/', '?', '*', '[', ']'];
    let sanitized: String = raw
        .chars()
        .map(|ch| {
            if invalid.contains(&ch) || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect();

    let sanitized = sanitized.trim().trim_matches('\'');
    if sanitized.is_empty() {
        return "Sheet".to_string();
    }

    sanitized.chars().take(31).collect()
}
