use crate::{
    Command, Feedback, WaitReason,
    analysis::{AnalysisResult, ResultId},
    error::SessionError,
    journal::{Journal, JournalEntry},
    reviewer::Reviewer,
    topic::{self, AttemptId},
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc::Sender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NoTopic,
    TopicReady,
    AwaitingRecording,
    AnalysisPending,
    ResultReady { saved: bool },
}

/// Audio recorded for one attempt. The attempt is captured when recording
/// starts, so a recording that outlives a topic change or retry is detected
/// as stale instead of being reviewed against the wrong topic.
#[derive(Debug, Clone)]
pub struct Recording {
    pub attempt: AttemptId,
    pub audio: Vec<u8>,
}

/// User actions. Each one maps to exactly one transition on [`CoachSession`].
#[derive(Debug, Clone)]
pub enum Event {
    NewTopic,
    RecordingSubmitted(Recording),
    Retry,
    Reevaluate,
    Refresh,
}

#[derive(Debug, Clone)]
struct CachedAnalysis {
    attempt: AttemptId,
    id: ResultId,
    result: Arc<AnalysisResult>,
}

pub struct CoachSession {
    pub phase: Phase,
    topic: Option<String>,
    retry_count: u32,
    recording: Option<Recording>,
    cached: Option<CachedAnalysis>,
    persisted: HashSet<ResultId>,
    analysis_failed: bool,
    // Set once the journal reports it is not configured; it cannot become
    // configured while the process runs.
    journal_disabled: bool,
}

impl Default for CoachSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CoachSession {
    pub fn new() -> Self {
        Self {
            phase: Phase::NoTopic,
            topic: None,
            retry_count: 0,
            recording: None,
            cached: None,
            persisted: HashSet::new(),
            analysis_failed: false,
            journal_disabled: false,
        }
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Identity that a recording started now would belong to.
    pub fn attempt(&self) -> Option<AttemptId> {
        self.topic
            .as_ref()
            .map(|topic| AttemptId::new(topic.clone(), self.retry_count))
    }

    /// The cached result, if it belongs to the current attempt.
    pub fn current_result(&self) -> Option<Arc<AnalysisResult>> {
        self.current_cached().map(|c| c.result.clone())
    }

    fn current_cached(&self) -> Option<&CachedAnalysis> {
        let attempt = self.attempt()?;
        self.cached.as_ref().filter(|c| c.attempt == attempt)
    }

    fn has_current_recording(&self) -> bool {
        match (&self.recording, self.attempt()) {
            (Some(rec), Some(attempt)) => rec.attempt == attempt,
            _ => false,
        }
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.phase == Phase::AnalysisPending {
            return Err(SessionError::Busy);
        }
        Ok(())
    }

    /// Dispatches one user action to its transition.
    pub async fn handle<R, J>(
        &mut self,
        reviewer: &R,
        journal: &J,
        event: Event,
        command_tx: &Sender<Command>,
    ) -> Result<(), SessionError>
    where
        R: Reviewer + ?Sized,
        J: Journal + ?Sized,
    {
        match event {
            Event::NewTopic => self.new_topic(reviewer, command_tx).await,
            Event::RecordingSubmitted(recording) => {
                self.submit_recording(reviewer, journal, recording, command_tx)
                    .await
            }
            Event::Retry => self.retry(),
            Event::Reevaluate => self.reevaluate(reviewer, journal, command_tx).await,
            Event::Refresh => self.refresh(reviewer, journal, command_tx).await,
        }
    }

    /// Asks the reviewer for a fresh topic and starts over on it.
    ///
    /// Topic generation never fails from the caller's point of view: any
    /// error is replaced by a fixed fallback topic.
    pub async fn new_topic<R>(
        &mut self,
        reviewer: &R,
        command_tx: &Sender<Command>,
    ) -> Result<(), SessionError>
    where
        R: Reviewer + ?Sized,
    {
        self.ensure_idle()?;
        emit(command_tx, Command::Waiting(WaitReason::GeneratingTopic)).await?;

        let topic = match reviewer.generate_topic().await {
            Ok(raw) => topic::normalize_topic(&raw).unwrap_or_else(|| {
                tracing::warn!("Reviewer returned an empty topic, using fallback.");
                topic::FALLBACK_TOPIC.to_string()
            }),
            Err(e) => {
                tracing::warn!("Topic generation failed: {}. Using fallback.", e);
                topic::fallback_topic(&e).to_string()
            }
        };
        self.use_topic(topic, command_tx).await
    }

    /// Starts over on a topic chosen by the caller.
    pub async fn use_topic(
        &mut self,
        topic: String,
        command_tx: &Sender<Command>,
    ) -> Result<(), SessionError> {
        self.ensure_idle()?;
        if self.phase == (Phase::ResultReady { saved: false }) {
            tracing::warn!("Leaving a result that was never saved to the journal.");
        }

        tracing::info!("New topic: {}", topic);
        self.topic = Some(topic.clone());
        self.retry_count = 0;
        self.recording = None;
        self.cached = None;
        self.analysis_failed = false;
        self.phase = Phase::TopicReady;
        emit(command_tx, Command::ShowTopic(topic)).await?;

        // The recording input is available as soon as the topic is shown.
        self.phase = Phase::AwaitingRecording;
        Ok(())
    }

    /// Accepts a recording for the current attempt and reviews it.
    pub async fn submit_recording<R, J>(
        &mut self,
        reviewer: &R,
        journal: &J,
        recording: Recording,
        command_tx: &Sender<Command>,
    ) -> Result<(), SessionError>
    where
        R: Reviewer + ?Sized,
        J: Journal + ?Sized,
    {
        self.ensure_idle()?;
        let attempt = self.attempt().ok_or(SessionError::NoTopic)?;
        if recording.attempt != attempt {
            return Err(SessionError::StaleRecording {
                expected: attempt,
                got: recording.attempt,
            });
        }
        if self.current_cached().is_some() {
            return Err(SessionError::AlreadyAnalyzed);
        }

        tracing::debug!(
            "Recording for {} received ({} bytes).",
            attempt,
            recording.audio.len()
        );
        self.recording = Some(recording);
        self.analysis_failed = false;
        self.phase = Phase::AwaitingRecording;
        self.refresh(reviewer, journal, command_tx).await
    }

    /// Discards the current recording and result, and waits for a new
    /// recording on the same topic.
    pub fn retry(&mut self) -> Result<(), SessionError> {
        self.ensure_idle()?;
        if self.topic.is_none() {
            return Err(SessionError::NoTopic);
        }
        self.retry_count += 1;
        self.recording = None;
        self.cached = None;
        self.analysis_failed = false;
        self.phase = Phase::AwaitingRecording;
        tracing::info!("Retry #{} on the current topic.", self.retry_count);
        Ok(())
    }

    /// Drops the cached result and reviews the same recording again.
    pub async fn reevaluate<R, J>(
        &mut self,
        reviewer: &R,
        journal: &J,
        command_tx: &Sender<Command>,
    ) -> Result<(), SessionError>
    where
        R: Reviewer + ?Sized,
        J: Journal + ?Sized,
    {
        self.ensure_idle()?;
        if self.topic.is_none() {
            return Err(SessionError::NoTopic);
        }
        if !self.has_current_recording() {
            return Err(SessionError::NoRecording);
        }
        tracing::info!("Re-evaluating the current recording.");
        self.cached = None;
        self.analysis_failed = false;
        self.phase = Phase::AwaitingRecording;
        self.refresh(reviewer, journal, command_tx).await
    }

    /// One refresh cycle: review a pending recording if there is no result
    /// yet, show the current result, and save it if it is not saved yet.
    pub async fn refresh<R, J>(
        &mut self,
        reviewer: &R,
        journal: &J,
        command_tx: &Sender<Command>,
    ) -> Result<(), SessionError>
    where
        R: Reviewer + ?Sized,
        J: Journal + ?Sized,
    {
        self.ensure_idle()?;
        let Some(attempt) = self.attempt() else {
            return Ok(());
        };

        if self.current_cached().is_none()
            && self.has_current_recording()
            && !self.analysis_failed
        {
            self.run_analysis(reviewer, attempt, command_tx).await?;
        }

        let Some(cached) = self.current_cached().cloned() else {
            return Ok(());
        };
        emit(
            command_tx,
            Command::ShowFeedback(Feedback {
                attempt: cached.attempt.clone(),
                result: cached.result.clone(),
            }),
        )
        .await?;

        if self.persisted.contains(&cached.id) {
            self.phase = Phase::ResultReady { saved: true };
            Ok(())
        } else if self.journal_disabled {
            self.phase = Phase::ResultReady { saved: false };
            Ok(())
        } else {
            self.persist(journal, &cached, command_tx).await
        }
    }

    async fn run_analysis<R>(
        &mut self,
        reviewer: &R,
        attempt: AttemptId,
        command_tx: &Sender<Command>,
    ) -> Result<(), SessionError>
    where
        R: Reviewer + ?Sized,
    {
        let Some(recording) = self.recording.as_ref() else {
            return Err(SessionError::NoRecording);
        };
        emit(command_tx, Command::Waiting(WaitReason::Analyzing)).await?;
        self.phase = Phase::AnalysisPending;

        tracing::info!("Reviewing recording for {}.", attempt);
        match reviewer.analyze(&attempt.topic, &recording.audio).await {
            Ok(result) => {
                let id = ResultId::of(&attempt.topic, &result);
                tracing::info!("Review for {} ready (result {}).", attempt, id);
                self.cached = Some(CachedAnalysis {
                    attempt,
                    id,
                    result: Arc::new(result),
                });
                self.phase = Phase::ResultReady { saved: false };
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Review for {} failed: {}", attempt, e);
                self.analysis_failed = true;
                self.phase = Phase::AwaitingRecording;
                emit(command_tx, Command::AnalysisFailed(e.to_string())).await
            }
        }
    }

    async fn persist<J>(
        &mut self,
        journal: &J,
        cached: &CachedAnalysis,
        command_tx: &Sender<Command>,
    ) -> Result<(), SessionError>
    where
        J: Journal + ?Sized,
    {
        emit(command_tx, Command::Waiting(WaitReason::Saving)).await?;
        let entry = JournalEntry::from_result(
            &cached.attempt.topic,
            &cached.result,
            chrono::Local::now(),
        );

        match journal.append(&entry).await {
            Ok(()) => {
                tracing::info!("Saved result {} to the journal.", cached.id);
                self.persisted.insert(cached.id.clone());
                self.phase = Phase::ResultReady { saved: true };
                emit(command_tx, Command::JournalSaved).await
            }
            Err(e) if e.is_not_configured() => {
                tracing::info!("Journal is not configured, results will not be saved: {}", e);
                self.journal_disabled = true;
                self.phase = Phase::ResultReady { saved: false };
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to save result {} to the journal, will retry on next refresh: {}",
                    cached.id,
                    e
                );
                self.phase = Phase::ResultReady { saved: false };
                Ok(())
            }
        }
    }
}

async fn emit(command_tx: &Sender<Command>, command: Command) -> Result<(), SessionError> {
    command_tx
        .send(command)
        .await
        .map_err(|_| SessionError::ChannelClosed)
}
