use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const TOPIC_PROMPT_KEY: &str = "topic_generator";
pub const COACH_PROMPT_KEY: &str = "speaking_coach";

const DEFAULT_TOPIC_PROMPT: &str = include_str!("../../../prompts/topic_generator.md");
const DEFAULT_COACH_PROMPT: &str = include_str!("../../../prompts/speaking_coach.md");

/// Reads every `*.md` file directly inside `dir_path`, keyed by file stem.
pub fn load_prompts(dir_path: &Path) -> Result<HashMap<String, String>> {
    let entries = fs::read_dir(dir_path)
        .with_context(|| format!("Cannot open prompts directory {}", dir_path.display()))?;

    let mut prompts = HashMap::new();
    for entry in entries {
        let path = entry?.path();
        let is_markdown = path.extension().is_some_and(|ext| ext == "md");
        if !path.is_file() || !is_markdown {
            continue;
        }
        let Some(key) = path.file_stem().and_then(|stem| stem.to_str()) else {
            tracing::warn!("Skipping prompt file with a non UTF-8 name: {}", path.display());
            continue;
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read prompt {}", path.display()))?;
        tracing::debug!("Loaded prompt {:?} ({} bytes).", key, text.len());
        prompts.insert(key.to_string(), text);
    }
    Ok(prompts)
}

/// The two prompts the coach sends, with built-in fallbacks.
#[derive(Debug, Clone)]
pub struct Prompts {
    topic: String,
    coach: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC_PROMPT.to_string(),
            coach: DEFAULT_COACH_PROMPT.to_string(),
        }
    }
}

impl Prompts {
    /// Loads prompt overrides from `dir_path`. A missing directory or a
    /// missing file falls back to the built-in prompt.
    pub fn load(dir_path: &Path) -> Self {
        let mut loaded = match load_prompts(dir_path) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!("{:#}. Using built-in prompts.", e);
                HashMap::new()
            }
        };
        let defaults = Self::default();
        let mut take = |key: &str, default: String| match loaded.remove(key) {
            Some(prompt) if !prompt.trim().is_empty() => prompt,
            _ => {
                tracing::debug!("No {}.md override, using built-in prompt.", key);
                default
            }
        };
        Self {
            topic: take(TOPIC_PROMPT_KEY, defaults.topic),
            coach: take(COACH_PROMPT_KEY, defaults.coach),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The coach prompt with `{topic}` filled in.
    pub fn coach(&self, topic: &str) -> String {
        self.coach.replace("{topic}", topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_only_markdown_files_are_loaded() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("speaking_coach.md"), "Review {topic}.")?;
        fs::write(dir.path().join("topic_generator.md"), "One topic, please.")?;
        fs::write(dir.path().join("notes.txt"), "not a prompt")?;
        fs::create_dir(dir.path().join("drafts.md"))?;

        let prompts = load_prompts(dir.path())?;

        let mut keys: Vec<_> = prompts.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, [COACH_PROMPT_KEY, TOPIC_PROMPT_KEY]);
        assert_eq!(prompts[COACH_PROMPT_KEY], "Review {topic}.");
        Ok(())
    }

    #[test]
    fn test_missing_prompts_dir_is_an_error() {
        let err = load_prompts(Path::new("no_such_prompts_dir")).unwrap_err();
        assert!(err.to_string().contains("no_such_prompts_dir"));
    }

    #[test]
    fn test_overrides_fill_in_topic() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("speaking_coach.md"),
            "Topic: \"{topic}\". Reply as JSON: {\"transcript\": \"...\"}",
        )?;

        let prompts = Prompts::load(dir.path());

        assert_eq!(
            prompts.coach("Travel (Du lịch)"),
            "Topic: \"Travel (Du lịch)\". Reply as JSON: {\"transcript\": \"...\"}"
        );
        // No override for the topic prompt: the built-in one is used.
        assert_eq!(prompts.topic(), Prompts::default().topic());
        Ok(())
    }

    #[test]
    fn test_missing_dir_uses_builtin_prompts() {
        let prompts = Prompts::load(Path::new("no_such_prompts_dir"));
        let coach = prompts.coach("Digital Minimalism (Lối sống tối giản kỹ thuật số)");
        assert!(coach.contains("\"Digital Minimalism (Lối sống tối giản kỹ thuật số)\""));
        assert!(coach.contains("\"repetition\""));
        assert!(!coach.contains("{topic}"));
        assert!(prompts.topic().contains("English Topic (Vietnamese Translation)"));
    }
}
