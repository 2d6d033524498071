use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw two-dimensional grid of cell text, exactly as read from a sheet.
pub type SheetGrid = Vec<Vec<String>>;

/// Background colour of a cell. Channels are fractions in `[0, 1]`; channels
/// the provider omits default to `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    #[serde(default)]
    pub red: f32,
    #[serde(default)]
    pub green: f32,
    #[serde(default)]
    pub blue: f32,
}

impl Color {
    pub const fn new(red: f32, green: f32, blue: f32) -> Self {
        Self { red, green, blue }
    }

    /// Builds a colour from 8-bit channels (`0xd9, 0xea, 0xd3`).
    pub fn from_rgb8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: f32::from(red) / 255.0,
            green: f32::from(green) / 255.0,
            blue: f32::from(blue) / 255.0,
        }
    }

    /// Packs the colour into a `0xRRGGBB` value.
    pub fn to_rgb_hex(self) -> u32 {
        let channel = |value: f32| (value.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.red) << 16) | (channel(self.green) << 8) | channel(self.blue)
    }
}

/// Handle on a single worksheet of a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worksheet {
    /// Provider-assigned numeric id, stable across renames.
    pub sheet_id: u64,
    pub title: String,
    pub row_count: usize,
    pub column_count: usize,
}

/// Zero-based, half-open block of cells. `None` bounds are open ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellRange {
    pub start_row: usize,
    pub end_row: Option<usize>,
    pub start_column: usize,
    pub end_column: Option<usize>,
}

impl CellRange {
    /// Every row from `start_row` onwards, restricted to a single column.
    pub fn column_from(column: usize, start_row: usize) -> Self {
        Self {
            start_row,
            end_row: None,
            start_column: column,
            end_column: Some(column + 1),
        }
    }

    /// A single row spanning `columns` columns.
    pub fn row(row: usize, columns: usize) -> Self {
        Self {
            start_row: row,
            end_row: Some(row + 1),
            start_column: 0,
            end_column: Some(columns),
        }
    }

    /// Renders the range in A1 notation qualified by the sheet title, for
    /// example `'Wars'!A4:A`.
    pub fn to_a1(&self, title: &str) -> String {
        let start = format!(
            "{}{}",
            column_letters(self.start_column),
            self.start_row + 1
        );
        let end_column = self
            .end_column
            .map(|end| end.max(self.start_column + 1) - 1)
            .map(column_letters)
            .unwrap_or_default();
        let end_row = self
            .end_row
            .map(|end| (end.max(self.start_row + 1)).to_string())
            .unwrap_or_default();
        let end = if end_column.is_empty() && end_row.is_empty() {
            // An open range needs at least a column to stay valid A1.
            column_letters(self.start_column)
        } else if end_column.is_empty() {
            format!("{}{end_row}", column_letters(self.start_column))
        } else {
            format!("{end_column}{end_row}")
        };
        format!("{}!{start}:{end}", quote_title(title))
    }
}

/// Quotes a sheet title for use in an A1 range, doubling embedded quotes.
pub fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Converts a zero-based column index into spreadsheet letters (0 -> `A`,
/// 26 -> `AA`).
pub fn column_letters(index: usize) -> String {
    let mut letters = Vec::new();
    let mut remaining = index + 1;
    while remaining > 0 {
        let rem = (remaining - 1) % 26;
        letters.push(b'A' + rem as u8);
        remaining = (remaining - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Cosmetic style applied to a block of cells.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CellStyle {
    pub bold: bool,
    pub background: Option<Color>,
}

/// One player of the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub identifier: String,
    pub name: String,
}

/// Raised when two active rows carry the same player tag. The later row wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateIdentifier {
    pub identifier: String,
    pub replaced_name: String,
    pub name: String,
    /// Zero-based row index in the source value grid.
    pub row: usize,
}

/// Player tag -> player name mapping built fresh on every run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Roster {
    entries: BTreeMap<String, String>,
    duplicates: Vec<DuplicateIdentifier>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entry. Replacements are remembered as
    /// [`DuplicateIdentifier`] events.
    pub fn insert(&mut self, identifier: String, name: String, row: usize) {
        if let Some(replaced_name) = self.entries.insert(identifier.clone(), name.clone()) {
            self.duplicates.push(DuplicateIdentifier {
                identifier,
                replaced_name,
                name,
                row,
            });
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.entries.get(identifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn duplicates(&self) -> &[DuplicateIdentifier] {
        &self.duplicates
    }

    /// Iterates entries in identifier order.
    pub fn entries(&self) -> impl Iterator<Item = RosterEntry> + '_ {
        self.entries.iter().map(|(identifier, name)| RosterEntry {
            identifier: identifier.clone(),
            name: name.clone(),
        })
    }

    /// Renders the roster as `[identifier, name]` rows.
    pub fn to_rows(&self) -> SheetGrid {
        self.entries
            .iter()
            .map(|(identifier, name)| vec![identifier.clone(), name.clone()])
            .collect()
    }
}

/// What the orchestrator does with a source sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetRole {
    /// Copy the raw grid verbatim.
    Mirror,
    /// Derive the roster from coloured rows.
    RosterSource,
}

impl SheetRole {
    /// Resolves the role of a source sheet from its title.
    pub fn for_title(title: &str, roster_sheet: &str) -> Self {
        if title == roster_sheet {
            SheetRole::RosterSource
        } else {
            SheetRole::Mirror
        }
    }
}

/// Terminal state of one source sheet after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetStatus {
    Mirrored { rows: usize },
    RosterSynced { entries: usize },
    Failed { reason: String },
}

impl SheetStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, SheetStatus::Failed { .. })
    }
}

/// Outcome recorded for one source sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetOutcome {
    pub title: String,
    pub status: SheetStatus,
}

/// Recovered condition worth reporting to the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncWarning {
    /// Header styling of the roster sheet failed; data was still written.
    HeaderFormat { sheet: String, reason: String },
    /// Two active rows shared a player tag.
    DuplicateIdentifier(DuplicateIdentifier),
    /// No colour metadata for a candidate row; it was treated as inactive.
    MissingColor { row: usize },
}

impl fmt::Display for SyncWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncWarning::HeaderFormat { sheet, reason } => {
                write!(f, "header formatting on '{sheet}' failed: {reason}")
            }
            SyncWarning::DuplicateIdentifier(duplicate) => write!(
                f,
                "duplicate player tag {} on row {}: '{}' replaced '{}'",
                duplicate.identifier,
                duplicate.row + 1,
                duplicate.name,
                duplicate.replaced_name
            ),
            SyncWarning::MissingColor { row } => {
                write!(f, "no colour metadata for row {}, treated as inactive", row + 1)
            }
        }
    }
}

/// Per-sheet outcomes plus warnings of a completed run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyncReport {
    pub sheets: Vec<SheetOutcome>,
    pub warnings: Vec<SyncWarning>,
}

impl SyncReport {
    pub fn failures(&self) -> impl Iterator<Item = &SheetOutcome> {
        self.sheets.iter().filter(|outcome| outcome.status.is_failed())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn status_of(&self, title: &str) -> Option<&SheetStatus> {
        self.sheets
            .iter()
            .find(|outcome| outcome.title == title)
            .map(|outcome| &outcome.status)
    }
}
