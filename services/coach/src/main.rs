use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coach_core::Command;
use coach_core::error::SessionError;
use coach_core::history::load_history;
use coach_core::journal::{DisabledJournal, Journal};
use coach_core::reviewer::Reviewer;
use coach_core::session_state::{CoachSession, Event, Recording};
use coach_native_utils::AudioError;
use coach_native_utils::recorder::Recorder;
use secrecy::SecretString;
use sheets_client::SpreadsheetRef;
use speaking_coach::config::Config;
use speaking_coach::gemini_adapter::GeminiReviewer;
use speaking_coach::prompt_loader::Prompts;
use speaking_coach::render;
use speaking_coach::sheets_adapter::SheetsJournal;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::{mpsc, oneshot};
use tracing_subscriber::fmt::time::ChronoLocal;

type StdinLines = Lines<BufReader<Stdin>>;

#[derive(Parser)]
#[command(version, about = "Speak about a topic and get coaching on logic, flow and natural phrasing.")]
struct Cli {
    /// Practice this topic instead of generating one
    #[arg(long)]
    topic: Option<String>,
    /// Review this WAV recording once and exit
    #[arg(long, value_name = "WAV")]
    audio: Option<PathBuf>,
    /// Input device to record from (see `devices`)
    #[arg(long)]
    device: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the saved journal, newest first
    History,
    /// List audio input devices
    Devices,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let mut config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    // Logs go to stderr; stdout carries the coach's output.
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    // --- 3. Parse Command-Line Arguments ---
    let args = Cli::parse();

    match args.command {
        Some(Commands::Devices) => return list_devices(),
        Some(Commands::History) => {
            let journal = build_journal(&config);
            println!("{}", render::history(&load_history(journal.as_ref()).await));
            return Ok(());
        }
        None => {}
    }

    // --- 4. Initialize API Clients ---
    let prompts = Prompts::load(&config.prompts_dir);
    let reviewer = build_reviewer(config.gemini_api_key.take(), &config, prompts)?;
    let journal = build_journal(&config);

    // --- 5. Session Setup ---
    // The session only emits commands; this task renders them.
    let (command_tx, command_rx) = mpsc::channel::<Command>(32);
    let renderer = tokio::spawn(render_commands(command_rx));

    let mut session = CoachSession::new();
    match args.topic {
        Some(topic) => session.use_topic(topic, &command_tx).await?,
        None => session.new_topic(&reviewer, &command_tx).await?,
    }

    if let Some(path) = args.audio {
        let audio = coach_native_utils::audio::load_wav(&path)
            .with_context(|| format!("Failed to load recording {}", path.display()))?;
        let attempt = session.attempt().context("No topic is active")?;
        session
            .submit_recording(
                &reviewer,
                journal.as_ref(),
                Recording { attempt, audio },
                &command_tx,
            )
            .await?;
    } else {
        run_interactive(
            &mut session,
            &reviewer,
            journal.as_ref(),
            args.device,
            &command_tx,
        )
        .await?;
    }

    drop(command_tx);
    renderer.await.context("Renderer task failed")?;
    tracing::info!("Shutting down...");
    Ok(())
}

fn build_reviewer(
    api_key: Option<SecretString>,
    config: &Config,
    prompts: Prompts,
) -> Result<GeminiReviewer> {
    let mut builder = gemini_client::Config::builder()
        .with_base_url(&config.gemini_base_url)
        .with_model(&config.gemini_model);
    match api_key {
        Some(key) => builder = builder.with_api_key(key),
        None => tracing::warn!(
            "GEMINI_API_KEY is not set. Topics fall back to a fixed one and recordings cannot be reviewed."
        ),
    }
    let client =
        gemini_client::Client::new(builder.build()).context("Failed to create Gemini client")?;
    Ok(GeminiReviewer::new(client, prompts))
}

fn build_journal(config: &Config) -> Box<dyn Journal> {
    let Some(credentials) = &config.journal_credentials else {
        tracing::warn!("No service-account credentials configured. The journal is disabled.");
        return Box::new(DisabledJournal);
    };
    let spreadsheet = match &config.journal_spreadsheet_id {
        Some(id) => SpreadsheetRef::Id(id.clone()),
        None => SpreadsheetRef::Name(config.journal_spreadsheet.clone()),
    };
    match SheetsJournal::from_credentials(credentials, spreadsheet, &config.journal_worksheet) {
        Ok(journal) => Box::new(journal),
        Err(e) => {
            tracing::error!("Failed to set up the journal, it is disabled: {}", e);
            Box::new(DisabledJournal)
        }
    }
}

fn list_devices() -> Result<()> {
    let devices = coach_native_utils::device::get_available_inputs()
        .context("Failed to list input devices")?;
    if devices.is_empty() {
        println!("No input devices found.");
    }
    for device in devices {
        println!("{device}");
    }
    Ok(())
}

async fn render_commands(mut command_rx: mpsc::Receiver<Command>) {
    while let Some(command) = command_rx.recv().await {
        match command {
            Command::ShowTopic(topic) => println!("{}", render::topic(&topic)),
            Command::Waiting(reason) => println!("{}", render::waiting(reason)),
            Command::ShowFeedback(feedback) => println!("{}", render::feedback(&feedback)),
            Command::AnalysisFailed(reason) => println!("{}", render::analysis_failed(&reason)),
            Command::JournalSaved => println!("{}", render::saved()),
        }
    }
}

fn print_menu() {
    println!(
        "\n[r] record  [a] retry  [e] re-evaluate  [f] show feedback  [t] new topic  [h] journal  [q] quit"
    );
}

async fn run_interactive<R, J>(
    session: &mut CoachSession,
    reviewer: &R,
    journal: &J,
    device: Option<String>,
    command_tx: &mpsc::Sender<Command>,
) -> Result<()>
where
    R: Reviewer + ?Sized,
    J: Journal + ?Sized,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_menu();
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read from stdin")?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl-C, shutting down...");
                return Ok(());
            }
        };
        // End of input.
        let Some(line) = line else {
            return Ok(());
        };

        let event = match line.trim() {
            "r" => match record(session, device.clone(), &mut lines).await? {
                Some(recording) => Event::RecordingSubmitted(recording),
                None => continue,
            },
            "a" => Event::Retry,
            "e" => Event::Reevaluate,
            "f" | "" => Event::Refresh,
            "t" => Event::NewTopic,
            "h" => {
                println!("{}", render::history(&load_history(journal).await));
                continue;
            }
            "q" => return Ok(()),
            other => {
                println!("Unknown choice {other:?}.");
                continue;
            }
        };

        let is_retry = matches!(event, Event::Retry);
        match session.handle(reviewer, journal, event, command_tx).await {
            Ok(()) if is_retry => println!("🔁 Ready for a new recording on the same topic."),
            Ok(()) => {}
            Err(SessionError::ChannelClosed) => {
                return Err(SessionError::ChannelClosed).context("Renderer stopped");
            }
            Err(e) => {
                tracing::warn!("Action rejected: {}", e);
                println!("⚠️  {e}");
            }
        }
    }
}

/// Records from the microphone until the user presses Enter.
///
/// The recorder lives on its own thread because cpal streams cannot move
/// between threads; stdin stays with the async loop.
async fn record(
    session: &CoachSession,
    device: Option<String>,
    lines: &mut StdinLines,
) -> Result<Option<Recording>> {
    let Some(attempt) = session.attempt() else {
        println!("⚠️  No topic yet. Press [t] to get one.");
        return Ok(None);
    };

    let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();
    let (done_tx, done_rx) = oneshot::channel();
    std::thread::spawn(move || {
        let _ = done_tx.send(capture(device.as_deref(), stop_rx));
    });

    println!("🎙  Recording... press Enter to stop.");
    lines.next_line().await.context("Failed to read from stdin")?;
    let _ = stop_tx.send(());

    match done_rx.await.context("Recorder thread stopped unexpectedly")? {
        Ok(audio) => Ok(Some(Recording { attempt, audio })),
        Err(e) => {
            tracing::warn!("Recording failed: {}", e);
            println!("⚠️  Recording failed: {e}");
            Ok(None)
        }
    }
}

fn capture(
    device: Option<&str>,
    stop_rx: std::sync::mpsc::Receiver<()>,
) -> Result<Vec<u8>, AudioError> {
    let device = coach_native_utils::device::get_or_default_input(device)?;
    let recorder = Recorder::start(&device)?;
    // Either an explicit stop or the sender being dropped ends the recording.
    let _ = stop_rx.recv();
    recorder.finish()
}
