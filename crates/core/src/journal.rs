use async_trait::async_trait;
use chrono::{DateTime, TimeZone};
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::error::ServiceError;

/// Column labels of the journal worksheet, in storage order.
pub const JOURNAL_HEADER: [&str; 6] = [
    "Time",
    "Topic",
    "Transcript",
    "Logic feedback",
    "Naturalness feedback",
    "Repeated words",
];

pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

/// One saved practice attempt, already flattened to text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: String,
    pub topic: String,
    pub transcript: String,
    pub logic_summary_text: String,
    pub natural_fixes_text: String,
    pub repeated_words_text: String,
}

impl JournalEntry {
    pub fn from_result<Tz: TimeZone>(
        topic: &str,
        result: &AnalysisResult,
        at: DateTime<Tz>,
    ) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let logic_summary_text = format!(
            "Status: {}\nComment: {}\nSuggestion: {}",
            result.logic_status, result.logic_comment, result.structure_suggestion
        );
        let natural_fixes_text = result
            .natural_fixes
            .iter()
            .map(|fix| format!("- '{}' -> '{}' ({})", fix.original, fix.better, fix.reason))
            .collect::<Vec<_>>()
            .join("\n");
        let repeated_words_text = result
            .repeated_words
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            topic: topic.to_string(),
            transcript: result.transcript.clone(),
            logic_summary_text,
            natural_fixes_text,
            repeated_words_text,
        }
    }

    /// Cells in [`JOURNAL_HEADER`] order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.timestamp.clone(),
            self.topic.clone(),
            self.transcript.clone(),
            self.logic_summary_text.clone(),
            self.natural_fixes_text.clone(),
            self.repeated_words_text.clone(),
        ]
    }

    /// Builds an entry from a stored row, matching cells to columns by header label.
    ///
    /// Columns the header does not know are ignored; missing cells (short rows
    /// are common in spreadsheets) are read as empty.
    pub fn from_record(header: &[String], row: &[String]) -> Self {
        let cell = |label: &str| -> String {
            header
                .iter()
                .position(|h| h.trim() == label)
                .and_then(|idx| row.get(idx))
                .cloned()
                .unwrap_or_default()
        };
        Self {
            timestamp: cell(JOURNAL_HEADER[0]),
            topic: cell(JOURNAL_HEADER[1]),
            transcript: cell(JOURNAL_HEADER[2]),
            logic_summary_text: cell(JOURNAL_HEADER[3]),
            natural_fixes_text: cell(JOURNAL_HEADER[4]),
            repeated_words_text: cell(JOURNAL_HEADER[5]),
        }
    }
}

/// Append-only store of past practice attempts.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Journal: Send + Sync {
    /// Appends one row, creating the backing worksheet with its header if needed.
    async fn append(&self, entry: &JournalEntry) -> Result<(), ServiceError>;

    /// All rows, oldest first. An absent or empty store yields an empty list.
    async fn read_all(&self) -> Result<Vec<JournalEntry>, ServiceError>;
}

/// Stand-in used when no journal credentials are configured.
pub struct DisabledJournal;

#[async_trait]
impl Journal for DisabledJournal {
    async fn append(&self, _entry: &JournalEntry) -> Result<(), ServiceError> {
        Err(ServiceError::NotConfigured(
            "journal credentials are missing".to_string(),
        ))
    }

    async fn read_all(&self) -> Result<Vec<JournalEntry>, ServiceError> {
        Err(ServiceError::NotConfigured(
            "journal credentials are missing".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests::sample_result;
    use crate::analysis::{LogicStatus, NaturalFix};
    use chrono::{FixedOffset, TimeZone};

    fn at() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 9, 7, 0)
            .unwrap()
    }

    #[test]
    fn test_from_result_formats_text_columns() {
        let mut result = sample_result();
        result.natural_fixes.push(NaturalFix {
            original: "make a photo".to_string(),
            better: "take a photo".to_string(),
            reason: "collocation".to_string(),
        });
        result.repeated_words.insert("actually".to_string());
        result.logic_status = LogicStatus::Rambling;

        let entry = JournalEntry::from_result("Travel (Du lịch)", &result, at());

        assert_eq!(entry.timestamp, "05/03/2024 09:07");
        assert_eq!(entry.topic, "Travel (Du lịch)");
        assert_eq!(entry.transcript, result.transcript);
        assert_eq!(
            entry.logic_summary_text,
            "Status: Lan man\nComment: Ý tưởng rõ ràng.\nSuggestion: Nêu quan điểm, rồi đưa ví dụ."
        );
        assert_eq!(
            entry.natural_fixes_text,
            "- 'I very like it' -> 'I really like it' (\"very\" không bổ nghĩa cho động từ.)\n- 'make a photo' -> 'take a photo' (collocation)"
        );
        assert_eq!(entry.repeated_words_text, "actually, like");
    }

    #[test]
    fn test_from_result_without_fixes_or_repetition() {
        let mut result = sample_result();
        result.natural_fixes.clear();
        result.repeated_words.clear();
        let entry = JournalEntry::from_result("Travel (Du lịch)", &result, at());
        assert_eq!(entry.natural_fixes_text, "");
        assert_eq!(entry.repeated_words_text, "");
    }

    #[test]
    fn test_record_round_trips_through_row() {
        let entry = JournalEntry::from_result("Travel (Du lịch)", &sample_result(), at());
        let header: Vec<String> = JOURNAL_HEADER.iter().map(|h| h.to_string()).collect();
        assert_eq!(JournalEntry::from_record(&header, &entry.to_row()), entry);
    }

    #[test]
    fn test_from_record_maps_by_label_and_pads_short_rows() {
        let header: Vec<String> = ["Topic", "Time", "Extra", "Transcript"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        let row: Vec<String> = ["Books (Sách)", "01/01/2024 10:00", "x"]
            .iter()
            .map(|c| c.to_string())
            .collect();

        let entry = JournalEntry::from_record(&header, &row);
        assert_eq!(entry.topic, "Books (Sách)");
        assert_eq!(entry.timestamp, "01/01/2024 10:00");
        assert_eq!(entry.transcript, "");
        assert_eq!(entry.logic_summary_text, "");
    }

    #[tokio::test]
    async fn test_disabled_journal_reports_not_configured() {
        let journal = DisabledJournal;
        let entry = JournalEntry::default();
        assert!(journal.append(&entry).await.unwrap_err().is_not_configured());
        assert!(journal.read_all().await.unwrap_err().is_not_configured());
    }
}
