use crate::auth::TokenProvider;
use crate::config::{Config, SpreadsheetRef};
use crate::error::SheetsError;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::OnceCell;

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    #[serde(default)]
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Client for a single worksheet in a Google spreadsheet.
///
/// The spreadsheet id is resolved on first use and remembered; so is the
/// fact that the worksheet exists.
pub struct Client {
    http: reqwest::Client,
    auth: Arc<dyn TokenProvider>,
    config: Config,
    spreadsheet_id: OnceCell<String>,
    worksheet_ready: AtomicBool,
}

impl Client {
    pub fn new(http: reqwest::Client, auth: Arc<dyn TokenProvider>, config: Config) -> Self {
        let spreadsheet_id = match config.spreadsheet() {
            SpreadsheetRef::Id(id) => OnceCell::new_with(Some(id.clone())),
            SpreadsheetRef::Name(_) => OnceCell::new(),
        };
        Self {
            http,
            auth,
            config,
            spreadsheet_id,
            worksheet_ready: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, SheetsError> {
        let token = self.auth.access_token().await?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!("Google API error ({}): {}", status, body);
        Err(SheetsError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SheetsError> {
        response
            .json::<T>()
            .await
            .map_err(|e| SheetsError::Decode(e.to_string()))
    }

    pub async fn spreadsheet_id(&self) -> Result<&str, SheetsError> {
        let id = self
            .spreadsheet_id
            .get_or_try_init(|| async {
                match self.config.spreadsheet() {
                    SpreadsheetRef::Id(id) => Ok(id.clone()),
                    SpreadsheetRef::Name(name) => self.find_spreadsheet(name).await,
                }
            })
            .await?;
        Ok(id.as_str())
    }

    async fn find_spreadsheet(&self, name: &str) -> Result<String, SheetsError> {
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            name.replace('\\', "\\\\").replace('\'', "\\'"),
            SPREADSHEET_MIME
        );
        let url = format!("{}/files", self.config.drive_base_url());
        let request = self.http.get(&url).query(&[
            ("q", query.as_str()),
            ("fields", "files(id,name)"),
            ("pageSize", "1"),
        ]);
        let list: FileList = Self::decode(self.send(request).await?).await?;
        let file = list
            .files
            .into_iter()
            .next()
            .ok_or_else(|| SheetsError::SpreadsheetNotFound(name.to_string()))?;
        tracing::info!("Resolved spreadsheet {:?} to id {}.", name, file.id);
        Ok(file.id)
    }

    async fn sheets(&self) -> Result<Vec<SheetProperties>, SheetsError> {
        let id = self.spreadsheet_id().await?;
        let url = format!("{}/spreadsheets/{}", self.config.sheets_base_url(), id);
        let request = self
            .http
            .get(&url)
            .query(&[("fields", "sheets.properties(sheetId,title)")]);
        let meta: SpreadsheetMeta = Self::decode(self.send(request).await?).await?;
        Ok(meta
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties)
            .collect())
    }

    /// Titles of all worksheets in the spreadsheet.
    pub async fn worksheet_titles(&self) -> Result<Vec<String>, SheetsError> {
        Ok(self
            .sheets()
            .await?
            .into_iter()
            .map(|sheet| sheet.title)
            .collect())
    }

    async fn worksheet_exists(&self) -> Result<bool, SheetsError> {
        if self.worksheet_ready.load(Ordering::Acquire) {
            return Ok(true);
        }
        Ok(self
            .worksheet_titles()
            .await?
            .iter()
            .any(|title| title == self.config.worksheet()))
    }

    /// Makes sure the worksheet exists with `header` as its first row.
    ///
    /// A missing worksheet is created together with its header. An existing
    /// worksheet with an empty first row gets the header written into it.
    pub async fn ensure_worksheet(&self, header: &[&str]) -> Result<(), SheetsError> {
        if self.worksheet_ready.load(Ordering::Acquire) {
            return Ok(());
        }

        let sheets = self.sheets().await?;
        if sheets
            .iter()
            .any(|sheet| sheet.title == self.config.worksheet())
        {
            self.ensure_header(header).await?;
        } else {
            let sheet_id = sheets
                .iter()
                .map(|sheet| sheet.sheet_id)
                .max()
                .map_or(0, |max| max + 1);
            self.add_worksheet(sheet_id, header).await?;
        }
        self.worksheet_ready.store(true, Ordering::Release);
        Ok(())
    }

    // One batch: either the worksheet appears with its header or nothing changes.
    async fn add_worksheet(&self, sheet_id: i64, header: &[&str]) -> Result<(), SheetsError> {
        let id = self.spreadsheet_id().await?;
        tracing::info!(
            "Worksheet {:?} not found, creating it.",
            self.config.worksheet()
        );
        let url = format!(
            "{}/spreadsheets/{}:batchUpdate",
            self.config.sheets_base_url(),
            id
        );
        let cells: Vec<_> = header
            .iter()
            .map(|label| serde_json::json!({ "userEnteredValue": { "stringValue": label } }))
            .collect();
        let body = serde_json::json!({
            "requests": [
                {
                    "addSheet": {
                        "properties": {
                            "sheetId": sheet_id,
                            "title": self.config.worksheet(),
                            "gridProperties": {
                                "rowCount": self.config.new_worksheet_rows(),
                                "columnCount": header.len(),
                            }
                        }
                    }
                },
                {
                    "appendCells": {
                        "sheetId": sheet_id,
                        "rows": [{ "values": cells }],
                        "fields": "userEnteredValue",
                    }
                }
            ]
        });
        self.send(self.http.post(&url).json(&body)).await?;
        Ok(())
    }

    async fn ensure_header(&self, header: &[&str]) -> Result<(), SheetsError> {
        let first_row = self
            .values(&format!("{}!1:1", self.quoted_worksheet()))
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();
        if first_row.iter().any(|cell| !cell.trim().is_empty()) {
            if first_row.iter().map(String::as_str).ne(header.iter().copied()) {
                tracing::warn!(
                    "Worksheet {:?} starts with {:?} instead of the journal header; leaving it as is.",
                    self.config.worksheet(),
                    first_row
                );
            }
            return Ok(());
        }

        tracing::info!(
            "Worksheet {:?} has no header row, writing it.",
            self.config.worksheet()
        );
        let id = self.spreadsheet_id().await?;
        let url = format!(
            "{}/spreadsheets/{}/values/{}",
            self.config.sheets_base_url(),
            id,
            urlencoding::encode(&self.range())
        );
        let request = self
            .http
            .put(&url)
            .query(&[("valueInputOption", "RAW")])
            .json(&serde_json::json!({ "values": [header] }));
        self.send(request).await?;
        Ok(())
    }

    /// Appends one row after the last non-empty row of the worksheet.
    /// Cells are stored as typed text, never parsed as formulas or dates.
    pub async fn append_row(&self, row: &[String]) -> Result<(), SheetsError> {
        let id = self.spreadsheet_id().await?;
        let url = format!(
            "{}/spreadsheets/{}/values/{}:append",
            self.config.sheets_base_url(),
            id,
            urlencoding::encode(&self.range())
        );
        let request = self
            .http
            .post(&url)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&serde_json::json!({ "values": [row] }));
        self.send(request).await?;
        tracing::debug!("Appended a row of {} cells.", row.len());
        Ok(())
    }

    /// All rows of the worksheet including the header, as displayed text.
    /// A worksheet that does not exist yet reads as empty.
    pub async fn read_rows(&self) -> Result<Vec<Vec<String>>, SheetsError> {
        if !self.worksheet_exists().await? {
            return Ok(Vec::new());
        }
        self.values(&self.quoted_worksheet()).await
    }

    async fn values(&self, range: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        let id = self.spreadsheet_id().await?;
        let url = format!(
            "{}/spreadsheets/{}/values/{}",
            self.config.sheets_base_url(),
            id,
            urlencoding::encode(range)
        );
        let values: ValueRange = Self::decode(self.send(self.http.get(&url)).await?).await?;
        Ok(values
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    fn quoted_worksheet(&self) -> String {
        format!("'{}'", self.config.worksheet().replace('\'', "''"))
    }

    fn range(&self) -> String {
        format!("{}!A1", self.quoted_worksheet())
    }
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
