use crate::journal::{Journal, JournalEntry};

/// What the history view shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum History {
    /// Nothing saved yet, or the journal is unavailable.
    Empty,
    /// Saved entries, newest first.
    Entries(Vec<JournalEntry>),
}

/// Reads the journal for display. Never fails: an unreachable or
/// unconfigured journal is shown as an empty history.
pub async fn load_history<J: Journal + ?Sized>(journal: &J) -> History {
    match journal.read_all().await {
        Ok(entries) if entries.is_empty() => History::Empty,
        Ok(mut entries) => {
            entries.reverse();
            History::Entries(entries)
        }
        Err(e) if e.is_not_configured() => {
            tracing::info!("Journal is disabled: {}", e);
            History::Empty
        }
        Err(e) => {
            tracing::warn!("Failed to read journal history: {}", e);
            History::Empty
        }
    }
}
