use async_trait::async_trait;
use coach_core::error::ServiceError;
use coach_core::journal::{JOURNAL_HEADER, Journal, JournalEntry};
use sheets_client::{
    Client, Config, ServiceAccountAuth, ServiceAccountKey, SheetsError, SpreadsheetRef,
};
use std::path::Path;
use std::sync::Arc;

/// Journal backed by one worksheet of a Google spreadsheet.
pub struct SheetsJournal {
    client: Client,
}

impl SheetsJournal {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a journal that authenticates with the service-account key at `credentials`.
    pub fn from_credentials(
        credentials: &Path,
        spreadsheet: SpreadsheetRef,
        worksheet: &str,
    ) -> Result<Self, SheetsError> {
        let key = ServiceAccountKey::from_file(credentials)?;
        let http = reqwest::Client::builder().use_rustls_tls().build()?;
        let auth = ServiceAccountAuth::new(http.clone(), key)?;
        tracing::info!(
            "Journal uses service account {} ({:?}, worksheet {:?}).",
            auth.client_email(),
            spreadsheet,
            worksheet
        );
        let config = Config::builder()
            .with_spreadsheet(spreadsheet)
            .with_worksheet(worksheet)
            .build();
        Ok(Self::new(Client::new(http, Arc::new(auth), config)))
    }
}

#[async_trait]
impl Journal for SheetsJournal {
    async fn append(&self, entry: &JournalEntry) -> Result<(), ServiceError> {
        self.client
            .ensure_worksheet(&JOURNAL_HEADER)
            .await
            .map_err(to_service_error)?;
        self.client
            .append_row(&entry.to_row())
            .await
            .map_err(to_service_error)
    }

    async fn read_all(&self) -> Result<Vec<JournalEntry>, ServiceError> {
        let rows = self.client.read_rows().await.map_err(to_service_error)?;
        let mut rows = rows.into_iter();
        let Some(header) = rows.next() else {
            return Ok(Vec::new());
        };
        Ok(rows
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .map(|row| JournalEntry::from_record(&header, &row))
            .collect())
    }
}

fn to_service_error(err: SheetsError) -> ServiceError {
    match err {
        SheetsError::Credentials(_) | SheetsError::Signing(_) => {
            ServiceError::NotConfigured(err.to_string())
        }
        SheetsError::Transport(e) => ServiceError::Transport(e.to_string()),
        SheetsError::Status { status, body } => ServiceError::Status { status, body },
        SheetsError::Decode(msg) => ServiceError::Malformed(msg),
        SheetsError::SpreadsheetNotFound(_) => ServiceError::Status {
            status: 404,
            body: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use sheets_client::StaticToken;

    fn journal_for(server: &ServerGuard) -> SheetsJournal {
        let config = Config::builder()
            .with_sheets_base_url(&server.url())
            .with_spreadsheet(SpreadsheetRef::Id("journal-1".into()))
            .build();
        SheetsJournal::new(Client::new(
            reqwest::Client::new(),
            Arc::new(StaticToken("token".into())),
            config,
        ))
    }

    async fn mock_titles(server: &mut ServerGuard, titles: &[&str]) {
        let sheets: Vec<_> = titles
            .iter()
            .map(|t| serde_json::json!({ "properties": { "title": t } }))
            .collect();
        server
            .mock("GET", "/spreadsheets/journal-1")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(serde_json::json!({ "sheets": sheets }).to_string())
            .create_async()
            .await;
    }

    fn entry() -> JournalEntry {
        JournalEntry {
            timestamp: "05/03/2024 09:07".into(),
            topic: "Digital Minimalism (Lối sống tối giản kỹ thuật số)".into(),
            transcript: "I think...".into(),
            logic_summary_text: "Status: Tốt\nComment: ...\nSuggestion: ...".into(),
            natural_fixes_text: "- 'I very like it' -> 'I really like it' (...)".into(),
            repeated_words_text: "like".into(),
        }
    }

    #[tokio::test]
    async fn test_first_append_creates_worksheet_and_writes_raw_row() {
        let mut server = Server::new_async().await;
        mock_titles(&mut server, &["Sheet1"]).await;
        let create = server
            .mock("POST", "/spreadsheets/journal-1:batchUpdate")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#""title":"Speaking_Journal""#.into()),
                Matcher::Regex(r#""columnCount":6"#.into()),
                Matcher::Regex(r#""appendCells""#.into()),
                Matcher::Regex(r#""stringValue":"Repeated words""#.into()),
            ]))
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;
        let row = server
            .mock("POST", Matcher::Regex(":append$".into()))
            .match_query(Matcher::UrlEncoded("valueInputOption".into(), "RAW".into()))
            .match_body(Matcher::Json(serde_json::json!({ "values": [entry().to_row()] })))
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        journal_for(&server).append(&entry()).await.unwrap();

        create.assert_async().await;
        row.assert_async().await;
    }

    #[tokio::test]
    async fn test_read_all_maps_rows_by_header() {
        let mut server = Server::new_async().await;
        mock_titles(&mut server, &["Speaking_Journal"]).await;
        server
            .mock("GET", Matcher::Regex("/values/".into()))
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "values": [
                        JOURNAL_HEADER,
                        entry().to_row(),
                        [],
                        ["06/03/2024 10:00", "Books (Sách)"]
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let entries = journal_for(&server).read_all().await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], entry());
        assert_eq!(entries[1].topic, "Books (Sách)");
        assert_eq!(entries[1].transcript, "");
    }

    #[tokio::test]
    async fn test_empty_journal_reads_as_no_entries() {
        let mut server = Server::new_async().await;
        mock_titles(&mut server, &["Speaking_Journal"]).await;
        server
            .mock("GET", Matcher::Regex("/values/".into()))
            .with_status(200)
            .with_body(r#"{"range": "Speaking_Journal!A1:Z1000"}"#)
            .create_async()
            .await;

        assert!(journal_for(&server).read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_errors_map_to_service_errors() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", Matcher::Any)
            .with_status(403)
            .with_body("forbidden")
            .create_async()
            .await;

        assert_eq!(
            journal_for(&server).read_all().await,
            Err(ServiceError::Status {
                status: 403,
                body: "forbidden".into()
            })
        );
    }

    #[test]
    fn test_missing_credentials_file() {
        let err = SheetsJournal::from_credentials(
            Path::new("/nonexistent/service_account.json"),
            SpreadsheetRef::Name("SPEAKING_JOURNAL".into()),
            "Speaking_Journal",
        )
        .err()
        .expect("missing file should fail");
        assert!(to_service_error(err).is_not_configured());
    }
}
