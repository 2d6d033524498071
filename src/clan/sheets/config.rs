use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clan::sheets::classify::{ABSENT_COLOR, ACTIVE_COLOR, DEFAULT_TOLERANCE};
use crate::clan::sheets::error::{Result, SyncError};
use crate::clan::sheets::model::Color;

/// Title of the sheet that is turned into a roster instead of mirrored.
pub const ROSTER_SHEET: &str = "Wars";
/// Label rows at the top of the roster source sheet.
pub const HEADER_OFFSET: usize = 3;
/// Row capacity of a freshly created roster sheet.
pub const ROSTER_CAPACITY_ROWS: usize = 1000;
/// Column capacity of a freshly created roster sheet.
pub const ROSTER_CAPACITY_COLUMNS: usize = 2;
/// Header row written above the roster entries.
pub const ROSTER_HEADERS: [&str; 2] = ["Player tag", "Player name"];
/// Background applied to the roster header row.
pub const HEADER_BACKGROUND: Color = Color::new(0.9, 0.9, 0.9);
/// Timeout applied to every spreadsheet API request.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Tunables of a sync run. Every field has a default so a configuration file
/// only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    pub roster_sheet: String,
    pub header_offset: usize,
    pub roster_capacity_rows: usize,
    pub roster_capacity_columns: usize,
    pub tolerance: f32,
    pub active_color: Color,
    /// Reference for rows marked absent. Not consulted by any decision yet.
    pub absent_color: Color,
    pub roster_headers: [String; 2],
    pub header_background: Color,
    pub request_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            roster_sheet: ROSTER_SHEET.to_string(),
            header_offset: HEADER_OFFSET,
            roster_capacity_rows: ROSTER_CAPACITY_ROWS,
            roster_capacity_columns: ROSTER_CAPACITY_COLUMNS,
            tolerance: DEFAULT_TOLERANCE,
            active_color: ACTIVE_COLOR,
            absent_color: ABSENT_COLOR,
            roster_headers: ROSTER_HEADERS.map(str::to_string),
            header_background: HEADER_BACKGROUND,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }
}

impl SyncConfig {
    /// Loads a JSON configuration file and validates it.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SyncError::MissingInput(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        let config: SyncConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.roster_sheet.trim().is_empty() {
            return Err(SyncError::InvalidConfig(
                "roster_sheet must not be empty".into(),
            ));
        }
        if !(self.tolerance > 0.0 && self.tolerance <= 1.0) {
            return Err(SyncError::InvalidConfig(format!(
                "tolerance must be in (0, 1], got {}",
                self.tolerance
            )));
        }
        if self.roster_capacity_rows == 0 || self.roster_capacity_columns < 2 {
            return Err(SyncError::InvalidConfig(format!(
                "roster capacity {}x{} cannot hold the two roster columns",
                self.roster_capacity_rows, self.roster_capacity_columns
            )));
        }
        Ok(())
    }
}
