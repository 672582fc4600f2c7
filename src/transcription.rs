//! Deepgram API client for speech-to-text transcription
//!
//! Sends the finished WAV file to the Deepgram prerecorded endpoint and
//! keeps durable bookkeeping next to the audio file: the raw response JSON
//! is always persisted, the trimmed transcript on success, and the error
//! detail on transport failure. The transcript is also copied to the system
//! clipboard.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;

const DEEPGRAM_BASE_URL: &str = "https://api.deepgram.com";

/// Global HTTP client for reuse across requests (avoids TLS handshake overhead)
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

fn http_client() -> &'static Client {
    HTTP_CLIENT.get_or_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client")
    })
}

/// Errors that can occur during transcription
#[derive(Debug)]
pub enum TranscriptionError {
    /// The audio file does not exist; no request was made.
    MissingAudio(PathBuf),
    /// Connection failure or non-2xx response. Detail is also persisted to
    /// the `.error` sidecar.
    Transport(String),
    /// The response did not contain a transcript at the expected location.
    /// The `.json` sidecar holds the body for inspection.
    MalformedResponse,
    /// Reading the audio or writing a sidecar failed.
    Io(String),
}

impl std::fmt::Display for TranscriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptionError::MissingAudio(path) => {
                write!(f, "Audio file missing: {}", path.display())
            }
            TranscriptionError::Transport(e) => write!(f, "Transcription request failed: {}", e),
            TranscriptionError::MalformedResponse => {
                write!(f, "Failed to extract transcript from response JSON")
            }
            TranscriptionError::Io(e) => write!(f, "Transcription I/O error: {}", e),
        }
    }
}

impl std::error::Error for TranscriptionError {}

/// Deepgram prerecorded-audio response, reduced to the fields we read.
#[derive(Debug, Deserialize)]
struct ListenResponse {
    results: Option<ListenResults>,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    #[serde(default)]
    channels: Vec<ListenChannel>,
}

#[derive(Debug, Deserialize)]
struct ListenChannel {
    #[serde(default)]
    alternatives: Vec<ListenAlternative>,
}

#[derive(Debug, Deserialize)]
struct ListenAlternative {
    transcript: Option<String>,
}

/// Sidecar path for `audio_path`: the full filename plus `.json` / `.txt` /
/// `.error`.
pub fn sidecar_path(audio_path: &Path, suffix: &str) -> PathBuf {
    let mut name = audio_path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Client for the Deepgram `/v1/listen` endpoint.
pub struct DeepgramClient {
    api_key: String,
    model: String,
    base_url: String,
    debug: bool,
}

impl DeepgramClient {
    pub fn new(config: &Config) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: DEEPGRAM_BASE_URL.to_string(),
            debug: config.debug,
        }
    }

    /// Point the client at a different endpoint. Used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Transcribe a finished WAV file.
    ///
    /// On any response received, the raw body is written to `<path>.json`
    /// before shape validation. On success the trimmed transcript is written
    /// to `<path>.txt`, copied to the clipboard, and any stale `<path>.error`
    /// is removed. Transport failures persist their detail to `<path>.error`.
    /// No retries.
    pub async fn transcribe(&self, audio_path: &Path) -> Result<String, TranscriptionError> {
        if !audio_path.exists() {
            return Err(TranscriptionError::MissingAudio(audio_path.to_path_buf()));
        }

        let json_path = sidecar_path(audio_path, "json");
        let txt_path = sidecar_path(audio_path, "txt");
        let error_path = sidecar_path(audio_path, "error");

        let body = tokio::fs::read(audio_path)
            .await
            .map_err(|e| TranscriptionError::Io(e.to_string()))?;

        log::info!(
            "Transcribing {} ({} bytes) with model {}",
            audio_path.display(),
            body.len(),
            self.model
        );

        let url = format!(
            "{}/v1/listen?model={}&smart_format=true",
            self.base_url, self.model
        );

        let response = http_client()
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/wav")
            .body(body)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                return Err(self.transport_failure(&error_path, e.to_string()).await);
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(t) => t,
            Err(e) => {
                return Err(self.transport_failure(&error_path, e.to_string()).await);
            }
        };

        if !status.is_success() {
            let detail = format!("HTTP {}: {}", status.as_u16(), text.trim());
            return Err(self.transport_failure(&error_path, detail).await);
        }

        // Persist the raw response before looking inside it, so a malformed
        // body can still be inspected.
        tokio::fs::write(&json_path, &text)
            .await
            .map_err(|e| TranscriptionError::Io(e.to_string()))?;

        if self.debug {
            eprintln!("DEBUG: full API response saved in {}:", json_path.display());
            eprintln!("{}", text);
        }

        let transcript = extract_transcript(&text).ok_or(TranscriptionError::MalformedResponse)?;
        let transcript = transcript.trim_end().to_string();

        tokio::fs::write(&txt_path, &transcript)
            .await
            .map_err(|e| TranscriptionError::Io(e.to_string()))?;

        copy_to_clipboard(&transcript);
        remove_stale_sidecar(&error_path).await;

        log::info!("Transcription successful: {} chars", transcript.len());
        Ok(transcript)
    }

    async fn transport_failure(&self, error_path: &Path, detail: String) -> TranscriptionError {
        log::error!("Deepgram request failed: {}", detail);
        if let Err(e) = tokio::fs::write(error_path, &detail).await {
            log::warn!("Failed to write error sidecar {:?}: {}", error_path, e);
        }
        TranscriptionError::Transport(detail)
    }
}

/// Locate the transcript at `results.channels[0].alternatives[0].transcript`.
fn extract_transcript(body: &str) -> Option<String> {
    let response: ListenResponse = serde_json::from_str(body).ok()?;
    response
        .results?
        .channels
        .into_iter()
        .next()?
        .alternatives
        .into_iter()
        .next()?
        .transcript
}

/// Clipboard delivery is best-effort: the sidecar files are the durable
/// output, so a headless environment only logs a warning.
pub fn copy_to_clipboard(text: &str) {
    match arboard::Clipboard::new() {
        Ok(mut clipboard) => {
            if let Err(e) = clipboard.set_text(text.to_string()) {
                log::warn!("Failed to copy transcript to clipboard: {}", e);
            }
        }
        Err(e) => log::warn!("Clipboard unavailable: {}", e),
    }
}

async fn remove_stale_sidecar(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("Failed to remove sidecar {:?}: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidecar_path_appends_suffix() {
        let path = Path::new("/home/me/.vox/recording_20260101_000000.wav");
        assert_eq!(
            sidecar_path(path, "json"),
            PathBuf::from("/home/me/.vox/recording_20260101_000000.wav.json")
        );
        assert_eq!(
            sidecar_path(path, "error"),
            PathBuf::from("/home/me/.vox/recording_20260101_000000.wav.error")
        );
    }

    #[test]
    fn test_extract_transcript_happy_path() {
        let body = r#"{"results":{"channels":[{"alternatives":[{"transcript":"hello world"}]}]}}"#;
        assert_eq!(extract_transcript(body), Some("hello world".to_string()));
    }

    #[test]
    fn test_extract_transcript_rejects_missing_fields() {
        assert_eq!(extract_transcript(r#"{"results":{}}"#), None);
        assert_eq!(extract_transcript(r#"{"results":{"channels":[]}}"#), None);
        assert_eq!(
            extract_transcript(r#"{"results":{"channels":[{"alternatives":[]}]}}"#),
            None
        );
        assert_eq!(extract_transcript("not json"), None);
        assert_eq!(extract_transcript("{}"), None);
    }

    #[test]
    fn test_error_display_names_failure_class() {
        let err = TranscriptionError::Transport("HTTP 500: boom".to_string());
        assert!(err.to_string().contains("HTTP 500"));

        let err = TranscriptionError::MissingAudio(PathBuf::from("/tmp/x.wav"));
        assert!(err.to_string().contains("/tmp/x.wav"));
    }
}
