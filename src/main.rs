//! Terminal front end for Vox
//!
//! Records until Enter, timeout, or Ctrl-C, then transcribes and copies the
//! result to the clipboard. Exit code 0 on success or interrupt, 1 on any
//! failure.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use vox::session::{RecordingError, Session, SessionOutcome, StopReason, StopSignal};
use vox::transcription::{sidecar_path, DeepgramClient, TranscriptionError};
use vox::{Config, CpalSource, VoxPaths};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    // Load .env file if present (for development convenience)
    let _ = dotenvy::dotenv();
    env_logger::init();

    let debug = std::env::args().nth(1).map_or(false, |arg| arg == "debug");

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}.", e);
            eprintln!("Please set it with: export DEEPGRAM_API_KEY='your-api-key'");
            eprintln!("Get your API key from https://console.deepgram.com");
            return std::process::ExitCode::FAILURE;
        }
    };
    config.debug = debug;

    let stop = StopSignal::new();

    // Ctrl-C feeds the same stop path as a manual stop; cleanup stays
    // single-sourced in the session controller.
    {
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                println!("\n> Ctrl+C detected, stopping recording...");
                stop.request(StopReason::Interrupted);
            }
        });
    }

    // Enter stops the session early.
    {
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut line = String::new();
            if io::stdin().lock().read_line(&mut line).is_ok() {
                stop.request(StopReason::Manual);
            }
        });
    }

    let outcome = run_recording(Arc::clone(&stop), config.max_duration).await;

    let audio_path = match outcome {
        Ok(SessionOutcome::Completed(path)) => path,
        Ok(SessionOutcome::Interrupted) => return std::process::ExitCode::SUCCESS,
        Err(RecordingError::NoAudioData) => {
            eprintln!("No audio data recorded.");
            return std::process::ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return std::process::ExitCode::FAILURE;
        }
    };

    println!(
        "> Transcribing with Deepgram API (model: {})...",
        config.model
    );

    let client = DeepgramClient::new(&config);
    match client.transcribe(&audio_path).await {
        Ok(_) => {
            println!(
                "> Transcript copied to clipboard from {}",
                sidecar_path(&audio_path, "txt").display()
            );
            std::process::ExitCode::SUCCESS
        }
        Err(e @ TranscriptionError::Transport(_)) => {
            eprintln!(
                "Error: Transcription failed. Deepgram response saved in {}",
                sidecar_path(&audio_path, "error").display()
            );
            log::debug!("{}", e);
            std::process::ExitCode::FAILURE
        }
        Err(TranscriptionError::MalformedResponse) => {
            eprintln!(
                "Error: Failed to extract transcript from JSON, check {}",
                sidecar_path(&audio_path, "json").display()
            );
            std::process::ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

/// Run one recording session on a blocking thread. The CPAL stream is not
/// Send, so the device lives entirely inside this closure.
async fn run_recording(
    stop: Arc<StopSignal>,
    max_duration: Duration,
) -> Result<SessionOutcome, RecordingError> {
    let task = tokio::task::spawn_blocking(move || {
        let paths = VoxPaths::new();
        let mut source = CpalSource::new().map_err(RecordingError::Device)?;
        let session = Session::start(&paths, &mut source, Arc::clone(&stop))?;

        println!(
            "> Recording started to {}...",
            session.target_path().display()
        );
        println!(
            "Press Enter to stop early (max {} seconds).",
            max_duration.as_secs()
        );

        let ticker_stop = Arc::clone(&stop);
        let ticker = thread::spawn(move || display_counter(&ticker_stop));

        let outcome = session.wait(max_duration);
        let _ = ticker.join();

        if matches!(outcome, Ok(SessionOutcome::Completed(_))) {
            println!("Recording stopped.");
        }
        outcome
    });

    match task.await {
        Ok(outcome) => outcome,
        Err(e) => Err(RecordingError::Io(io::Error::other(format!(
            "recording task failed: {}",
            e
        )))),
    }
}

/// Repaint the elapsed time on one line until a stop condition is observed.
/// The only polling loop in the program; everything else blocks.
fn display_counter(stop: &StopSignal) {
    let start = Instant::now();
    while stop.requested().is_none() {
        let elapsed = start.elapsed().as_secs();
        print!("\r> Recording time: {:02}:{:02}", elapsed / 60, elapsed % 60);
        let _ = io::stdout().flush();
        thread::sleep(Duration::from_millis(200));
    }
    print!("\r{}\r", " ".repeat(30));
    let _ = io::stdout().flush();
}
