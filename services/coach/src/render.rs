//! Plain-text presentation of session commands and journal history.

use coach_core::history::History;
use coach_core::{Feedback, WaitReason};
use std::fmt::Write;

const RULE: &str = "────────────────────────────────────────";

pub fn topic(topic: &str) -> String {
    format!("\n🎯 Topic: {topic}\n")
}

pub fn waiting(reason: WaitReason) -> &'static str {
    match reason {
        WaitReason::GeneratingTopic => "⏳ Finding an interesting topic for you...",
        WaitReason::Analyzing => "⏳ The coach is listening to your answer...",
        WaitReason::Saving => "⏳ Saving to your journal...",
    }
}

pub fn saved() -> &'static str {
    "✅ Saved to your speaking journal."
}

pub fn analysis_failed(reason: &str) -> String {
    format!("❌ The coach could not review this recording: {reason}\n   Use [e] to try the same recording again or [a] to record a new one.")
}

/// Transcript, logic card, one card per natural fix and the repetition warning.
pub fn feedback(feedback: &Feedback) -> String {
    let result = &feedback.result;
    let mut out = String::new();

    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "📝 What you said ({})", feedback.attempt);
    let _ = writeln!(out, "{}", quoted(&result.transcript));

    let _ = writeln!(out, "\n🧠 Logic & flow: {}", result.logic_status);
    if !result.logic_comment.is_empty() {
        let _ = writeln!(out, "   {}", result.logic_comment);
    }
    if !result.structure_suggestion.is_empty() {
        let _ = writeln!(out, "   💡 Better structure: {}", result.structure_suggestion);
    }

    let _ = writeln!(out, "\n🗣  Naturalness");
    if result.natural_fixes.is_empty() {
        let _ = writeln!(out, "   🌟 Your phrasing sounds natural. Nothing to upgrade!");
    }
    for fix in &result.natural_fixes {
        let _ = writeln!(out, "   ✗ {}", fix.original);
        let _ = writeln!(out, "   ✓ {}", fix.better);
        if !fix.reason.is_empty() {
            let _ = writeln!(out, "     {}", fix.reason);
        }
    }

    if !result.repeated_words.is_empty() {
        let words: Vec<&str> = result.repeated_words.iter().map(String::as_str).collect();
        let _ = writeln!(
            out,
            "\n⚠️  You repeated these words a lot: {}",
            words.join(", ")
        );
    }
    let _ = write!(out, "{RULE}");
    out
}

pub fn history(history: &History) -> String {
    let entries = match history {
        History::Empty => return "📓 No journal entries yet.".to_string(),
        History::Entries(entries) => entries,
    };
    let mut out = format!("📓 Journal ({} entries, newest first)\n", entries.len());
    for entry in entries {
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "{} · {}", entry.timestamp, entry.topic);
        if !entry.transcript.is_empty() {
            let _ = writeln!(out, "{}", quoted(&entry.transcript));
        }
        if !entry.logic_summary_text.is_empty() {
            let _ = writeln!(out, "{}", indent(&entry.logic_summary_text));
        }
        if !entry.natural_fixes_text.is_empty() {
            let _ = writeln!(out, "{}", indent(&entry.natural_fixes_text));
        }
        if !entry.repeated_words_text.is_empty() {
            let _ = writeln!(out, "   Repeated: {}", entry.repeated_words_text);
        }
    }
    let _ = write!(out, "{RULE}");
    out
}

fn quoted(text: &str) -> String {
    if text.is_empty() {
        "   (nothing was transcribed)".to_string()
    } else {
        format!("   \"{text}\"")
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("   {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
