//! Google Sheets API v4 backend.
//!
//! Auth uses an OAuth2 access token (bearer) obtained by the caller; this
//! module never loads credentials itself. Every call is blocking and the
//! client applies a single request timeout.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::clan::sheets::error::{Result, SyncError};
use crate::clan::sheets::io::SpreadsheetClient;
use crate::clan::sheets::model::{
    CellRange, CellStyle, Color, SheetGrid, Worksheet, column_letters, quote_title,
};

const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets/";

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    properties: SpreadsheetProperties,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct SpreadsheetProperties {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    #[serde(default)]
    sheet_id: u64,
    title: String,
    #[serde(default)]
    grid_properties: GridProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridProperties {
    #[serde(default)]
    row_count: usize,
    #[serde(default)]
    column_count: usize,
}

impl From<SheetProperties> for Worksheet {
    fn from(properties: SheetProperties) -> Self {
        Worksheet {
            sheet_id: properties.sheet_id,
            title: properties.title,
            row_count: properties.grid_properties.row_count,
            column_count: properties.grid_properties.column_count,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct GridDataResponse {
    #[serde(default)]
    sheets: Vec<GridSheet>,
}

#[derive(Debug, Deserialize)]
struct GridSheet {
    #[serde(default)]
    data: Vec<GridData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridData {
    #[serde(default)]
    row_data: Vec<RowData>,
}

#[derive(Debug, Default, Deserialize)]
struct RowData {
    #[serde(default)]
    values: Vec<CellData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CellData {
    effective_format: Option<CellFormat>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CellFormat {
    background_color: Option<Color>,
}

#[derive(Debug, Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// Blocking client for the Sheets REST API.
#[derive(Clone)]
pub struct GoogleSheetsClient {
    client: Client,
    token: String,
    base: Url,
}

impl GoogleSheetsClient {
    /// Builds a client sending `token` as bearer on every request.
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base = Url::parse(API_BASE)
            .map_err(|err| SyncError::InvalidConfig(format!("invalid API base: {err}")))?;
        Ok(Self {
            client,
            token: token.into(),
            base,
        })
    }

    /// Points the client at another API root, such as a local emulator.
    pub fn with_base_url(mut self, base: &str) -> Result<Self> {
        self.base = Url::parse(base)
            .map_err(|err| SyncError::InvalidConfig(format!("invalid API base {base}: {err}")))?;
        Ok(self)
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::InvalidConfig(format!("API base {} cannot hold a path", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.bearer_auth(&self.token).send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(SyncError::Api {
            status: status.as_u16(),
            message: api_error_message(&body),
        })
    }

    fn batch_update(&self, spreadsheet_id: &str, requests: Value) -> Result<BatchUpdateResponse> {
        let request = self.batch_update_request(spreadsheet_id, requests)?;
        Ok(self.send(request)?.json()?)
    }

    fn batch_update_request(&self, spreadsheet_id: &str, requests: Value) -> Result<RequestBuilder> {
        let url = self.url(&[&format!("{spreadsheet_id}:batchUpdate")])?;
        Ok(self.client.post(url).json(&json!({ "requests": requests })))
    }

    fn clear_request(&self, spreadsheet_id: &str, title: &str) -> Result<RequestBuilder> {
        let range = format!("{}:clear", quote_title(title));
        let url = self.url(&[spreadsheet_id, "values", &range])?;
        Ok(self.client.post(url).json(&json!({})))
    }

    fn update_request(
        &self,
        spreadsheet_id: &str,
        title: &str,
        row: usize,
        column: usize,
        values: &SheetGrid,
    ) -> Result<RequestBuilder> {
        let anchor = format!("{}!{}{}", quote_title(title), column_letters(column), row + 1);
        let url = self.url(&[spreadsheet_id, "values", &anchor])?;
        Ok(self
            .client
            .put(url)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "majorDimension": "ROWS", "values": values })))
    }

    fn metadata(&self, spreadsheet_id: &str) -> Result<SpreadsheetMetadata> {
        let url = self.url(&[spreadsheet_id])?;
        let request = self
            .client
            .get(url)
            .query(&[("fields", "properties.title,sheets.properties")]);
        Ok(self.send(request)?.json()?)
    }
}

impl SpreadsheetClient for GoogleSheetsClient {
    #[instrument(level = "debug", skip(self))]
    fn open(&self, spreadsheet_id: &str) -> Result<String> {
        self.metadata(spreadsheet_id)
            .map(|metadata| metadata.properties.title)
            .map_err(|err| SyncError::Access {
                spreadsheet: spreadsheet_id.to_string(),
                reason: err.to_string(),
            })
    }

    fn worksheets(&self, spreadsheet_id: &str) -> Result<Vec<Worksheet>> {
        Ok(self
            .metadata(spreadsheet_id)?
            .sheets
            .into_iter()
            .map(|entry| Worksheet::from(entry.properties))
            .collect())
    }

    #[instrument(level = "debug", skip(self))]
    fn values(&self, spreadsheet_id: &str, title: &str) -> Result<SheetGrid> {
        let url = self.url(&[spreadsheet_id, "values", &quote_title(title)])?;
        let range: ValueRange = self.send(self.client.get(url))?.json()?;
        let grid = rectangular(range.values);
        debug!(rows = grid.len(), "fetched sheet values");
        Ok(grid)
    }

    #[instrument(level = "debug", skip(self))]
    fn background_colors(
        &self,
        spreadsheet_id: &str,
        title: &str,
        range: CellRange,
    ) -> Result<Vec<Option<Color>>> {
        let url = self.url(&[spreadsheet_id])?;
        let request = self.client.get(url).query(&[
            ("ranges", range.to_a1(title)),
            (
                "fields",
                "sheets.data.rowData.values.effectiveFormat.backgroundColor".to_string(),
            ),
        ]);
        let response: GridDataResponse = self.send(request)?.json()?;
        Ok(first_column_colors(response))
    }

    #[instrument(level = "debug", skip(self))]
    fn add_worksheet(
        &mut self,
        spreadsheet_id: &str,
        title: &str,
        rows: usize,
        columns: usize,
    ) -> Result<Worksheet> {
        let response = self
            .batch_update(
                spreadsheet_id,
                json!([{
                    "addSheet": {
                        "properties": {
                            "title": title,
                            "gridProperties": { "rowCount": rows, "columnCount": columns }
                        }
                    }
                }]),
            )
            .map_err(|err| SyncError::write(title, err))?;
        let properties = response
            .replies
            .into_iter()
            .next()
            .and_then(|reply| reply.pointer("/addSheet/properties").cloned())
            .ok_or_else(|| SyncError::write(title, "addSheet reply carried no properties"))?;
        let properties: SheetProperties = serde_json::from_value(properties)?;
        Ok(properties.into())
    }

    fn clear(&mut self, spreadsheet_id: &str, sheet: &Worksheet) -> Result<()> {
        self.clear_request(spreadsheet_id, &sheet.title)
            .and_then(|request| self.send(request))
            .map_err(|err| SyncError::write(&sheet.title, err))?;
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
        self.update_request(spreadsheet_id, &sheet.title, row, column, values)
            .and_then(|request| self.send(request))
            .map_err(|err| SyncError::write(&sheet.title, err))?;
        Ok(())
    }

    fn format(
        &mut self,
        spreadsheet_id: &str,
        sheet: &Worksheet,
        range: CellRange,
        style: CellStyle,
    ) -> Result<()> {
        self.batch_update(spreadsheet_id, json!([repeat_cell_request(sheet, range, style)]))
            .map_err(|err| SyncError::FormatApply {
                sheet: sheet.title.clone(),
                reason: err.to_string(),
            })?;
        Ok(())
    }
}

/// Pads ragged rows with empty strings, the way the provider's own clients
/// present a full sheet.
fn rectangular(values: Vec<Vec<Value>>) -> SheetGrid {
    let width = values.iter().map(Vec::len).max().unwrap_or(0);
    values
        .into_iter()
        .map(|row| {
            let mut cells: Vec<String> = row.into_iter().map(value_to_text).collect();
            cells.resize(width, String::new());
            cells
        })
        .collect()
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn first_column_colors(response: GridDataResponse) -> Vec<Option<Color>> {
    response
        .sheets
        .into_iter()
        .flat_map(|sheet| sheet.data)
        .flat_map(|data| data.row_data)
        .map(|row| {
            row.values
                .into_iter()
                .next()
                .and_then(|cell| cell.effective_format)
                .and_then(|format| format.background_color)
        })
        .collect()
}

fn repeat_cell_request(sheet: &Worksheet, range: CellRange, style: CellStyle) -> Value {
    let mut grid_range = json!({
        "sheetId": sheet.sheet_id,
        "startRowIndex": range.start_row,
        "startColumnIndex": range.start_column,
    });
    if let Some(end_row) = range.end_row {
        grid_range["endRowIndex"] = json!(end_row);
    }
    if let Some(end_column) = range.end_column {
        grid_range["endColumnIndex"] = json!(end_column);
    }

    let mut format = json!({ "textFormat": { "bold": style.bold } });
    let mut fields = vec!["userEnteredFormat.textFormat.bold"];
    if let Some(background) = style.background {
        format["backgroundColor"] = json!(background);
        fields.push("userEnteredFormat.backgroundColor");
    }

    json!({
        "repeatCell": {
            "range": grid_range,
            "cell": { "userEnteredFormat": format },
            "fields": fields.join(","),
        }
    })
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}
