pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";
pub const DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_SPREADSHEET: &str = "SPEAKING_JOURNAL";
pub const DEFAULT_WORKSHEET: &str = "Speaking_Journal";

/// How the spreadsheet is located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpreadsheetRef {
    /// Looked up by exact title through the Drive files search.
    Name(String),
    Id(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    sheets_base_url: String,
    drive_base_url: String,
    spreadsheet: SpreadsheetRef,
    worksheet: String,
    new_worksheet_rows: u32,
}

pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_sheets_base_url(mut self, url: &str) -> Self {
        self.config.sheets_base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_drive_base_url(mut self, url: &str) -> Self {
        self.config.drive_base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_spreadsheet(mut self, spreadsheet: SpreadsheetRef) -> Self {
        self.config.spreadsheet = spreadsheet;
        self
    }

    pub fn with_worksheet(mut self, worksheet: &str) -> Self {
        self.config.worksheet = worksheet.to_string();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sheets_base_url: SHEETS_BASE_URL.to_string(),
            drive_base_url: DRIVE_BASE_URL.to_string(),
            spreadsheet: SpreadsheetRef::Name(DEFAULT_SPREADSHEET.to_string()),
            worksheet: DEFAULT_WORKSHEET.to_string(),
            new_worksheet_rows: 1000,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn sheets_base_url(&self) -> &str {
        &self.sheets_base_url
    }

    pub fn drive_base_url(&self) -> &str {
        &self.drive_base_url
    }

    pub fn spreadsheet(&self) -> &SpreadsheetRef {
        &self.spreadsheet
    }

    pub fn worksheet(&self) -> &str {
        &self.worksheet
    }

    pub fn new_worksheet_rows(&self) -> u32 {
        self.new_worksheet_rows
    }
}
