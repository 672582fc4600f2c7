//! Tray-style GUI front end for Vox
//!
//! Same session controller and transcription client as the terminal binary;
//! only the driving differs. The Stop button feeds the shared `StopSignal`,
//! and failures never exit the process: the status line reports them and the
//! controls return to their ready state.

// Prevents additional console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use eframe::egui::{self, Button, TextEdit, ViewportBuilder};

use vox::config::{DEFAULT_MAX_DURATION_SECS, DEFAULT_MODEL};
use vox::session::{Session, SessionOutcome, StopReason, StopSignal};
use vox::transcription::{copy_to_clipboard, DeepgramClient};
use vox::{Config, CpalSource, VoxPaths};

fn main() -> Result<(), eframe::Error> {
    // Load .env file if present (for development convenience)
    let _ = dotenvy::dotenv();
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([450.0, 375.0])
            .with_resizable(false),
        ..Default::default()
    };
    eframe::run_native("Vox", options, Box::new(|_cc| Box::new(VoxApp::new())))
}

/// Progress reports from the recording worker thread to the UI.
enum WorkerEvent {
    Started(PathBuf),
    Transcribing,
    Done(String),
    Interrupted,
    Failed(String),
}

struct VoxApp {
    api_key: String,
    max_duration_input: String,
    model_input: String,
    status: String,
    transcript: String,
    recording: bool,
    transcribing: bool,
    started_at: Option<Instant>,
    stop: Option<Arc<StopSignal>>,
    events: Option<mpsc::Receiver<WorkerEvent>>,
}

impl VoxApp {
    fn new() -> Self {
        Self {
            // Pre-fill from the environment so terminal users feel at home.
            api_key: std::env::var("DEEPGRAM_API_KEY").unwrap_or_default(),
            max_duration_input: DEFAULT_MAX_DURATION_SECS.to_string(),
            model_input: DEFAULT_MODEL.to_string(),
            status: "Ready to record".to_string(),
            transcript: String::new(),
            recording: false,
            transcribing: false,
            started_at: None,
            stop: None,
            events: None,
        }
    }

    fn start_recording(&mut self) {
        let api_key = self.api_key.trim().to_string();
        if api_key.is_empty() {
            self.status = "Enter a Deepgram API key first".to_string();
            return;
        }

        let max_duration = match self.max_duration_input.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                self.status = "Max duration must be a positive number of seconds".to_string();
                return;
            }
        };

        let model = match self.model_input.trim() {
            "" => DEFAULT_MODEL.to_string(),
            model => model.to_string(),
        };

        let config = Config {
            api_key,
            max_duration,
            model,
            debug: false,
        };

        let stop = StopSignal::new();
        let (tx, rx) = mpsc::channel();
        self.stop = Some(Arc::clone(&stop));
        self.events = Some(rx);
        self.recording = true;
        self.transcribing = false;
        self.transcript.clear();
        self.started_at = Some(Instant::now());
        self.status = "Recording...".to_string();

        thread::spawn(move || run_pipeline(config, stop, tx));
    }

    fn stop_recording(&self) {
        // Same stop seam the terminal's Enter watcher uses.
        if let Some(stop) = &self.stop {
            stop.request(StopReason::Manual);
        }
    }

    fn drain_events(&mut self) {
        let events: Vec<WorkerEvent> = match &self.events {
            Some(rx) => rx.try_iter().collect(),
            None => return,
        };

        for event in events {
            match event {
                WorkerEvent::Started(path) => {
                    self.status = format!("Recording to {}...", path.display());
                }
                WorkerEvent::Transcribing => {
                    self.recording = false;
                    self.transcribing = true;
                    self.status = "Transcribing...".to_string();
                }
                WorkerEvent::Done(text) => {
                    self.transcribing = false;
                    self.transcript = text;
                    self.status = "Transcript copied to clipboard".to_string();
                }
                WorkerEvent::Interrupted => {
                    self.recording = false;
                    self.transcribing = false;
                    self.status = "Recording interrupted, nothing saved".to_string();
                }
                WorkerEvent::Failed(message) => {
                    // Recoverable for the process: report and re-enable input.
                    self.recording = false;
                    self.transcribing = false;
                    self.status = format!("Error: {}", message);
                }
            }
        }
    }
}

impl eframe::App for VoxApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.label("Deepgram API Key:");
            ui.add(TextEdit::singleline(&mut self.api_key).password(true));

            ui.label("Max Duration (seconds):");
            ui.text_edit_singleline(&mut self.max_duration_input);

            ui.label("Deepgram Model:");
            ui.text_edit_singleline(&mut self.model_input);

            ui.separator();
            ui.label(&self.status);

            let elapsed = match (self.recording, self.started_at) {
                (true, Some(started_at)) => started_at.elapsed().as_secs(),
                _ => 0,
            };
            ui.label(format!(
                "Recording time: {:02}:{:02}",
                elapsed / 60,
                elapsed % 60
            ));

            ui.separator();
            let idle = !self.recording && !self.transcribing;

            if ui
                .add_enabled(idle, Button::new("Start Recording"))
                .clicked()
            {
                self.start_recording();
            }

            if ui
                .add_enabled(self.recording, Button::new("Stop Recording"))
                .clicked()
            {
                self.stop_recording();
            }

            if ui
                .add_enabled(!self.transcript.is_empty(), Button::new("Copy Transcript"))
                .clicked()
            {
                copy_to_clipboard(&self.transcript);
                self.status = "Transcript copied to clipboard".to_string();
            }
        });

        // Keep the elapsed-time label moving while a session is running.
        if self.recording || self.transcribing {
            ctx.request_repaint_after(Duration::from_millis(200));
        }
    }
}

/// One full record-then-transcribe pass on a worker thread. Every outcome is
/// reported as an event; the process never exits from here.
fn run_pipeline(config: Config, stop: Arc<StopSignal>, tx: mpsc::Sender<WorkerEvent>) {
    let paths = VoxPaths::new();

    let mut source = match CpalSource::new() {
        Ok(source) => source,
        Err(e) => {
            let _ = tx.send(WorkerEvent::Failed(e.to_string()));
            return;
        }
    };

    let session = match Session::start(&paths, &mut source, stop) {
        Ok(session) => session,
        Err(e) => {
            let _ = tx.send(WorkerEvent::Failed(e.to_string()));
            return;
        }
    };
    let _ = tx.send(WorkerEvent::Started(session.target_path().to_path_buf()));

    let audio_path = match session.wait(config.max_duration) {
        Ok(SessionOutcome::Completed(path)) => path,
        Ok(SessionOutcome::Interrupted) => {
            let _ = tx.send(WorkerEvent::Interrupted);
            return;
        }
        Err(e) => {
            let _ = tx.send(WorkerEvent::Failed(e.to_string()));
            return;
        }
    };

    let _ = tx.send(WorkerEvent::Transcribing);

    // The client is async; give this worker its own small runtime.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            let _ = tx.send(WorkerEvent::Failed(format!(
                "Failed to start transcription runtime: {}",
                e
            )));
            return;
        }
    };

    let client = DeepgramClient::new(&config);
    match runtime.block_on(client.transcribe(&audio_path)) {
        Ok(text) => {
            let _ = tx.send(WorkerEvent::Done(text));
        }
        Err(e) => {
            let _ = tx.send(WorkerEvent::Failed(e.to_string()));
        }
    }
}
