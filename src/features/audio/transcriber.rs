//! Whisper transcription collaborator
//!
//! Downloads an audio attachment and transcribes it through the OpenAI
//! Whisper API. Only formats Whisper accepts natively are supported;
//! anything else is rejected before the upload.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use async_trait::async_trait;
use log::{error, info, warn};
use std::process::Command;
use tokio::fs;

/// Formats the Whisper API accepts without conversion.
const SUPPORTED_FORMATS: &[&str] = &[".mp3", ".mp4", ".m4a", ".wav", ".webm", ".mpeg", ".mpga", ".ogg"];

/// Ceiling in seconds on the attachment download.
const DOWNLOAD_TIMEOUT_SECS: &str = "30";

/// Ceiling in seconds on the Whisper upload and transcription.
const UPLOAD_TIMEOUT_SECS: &str = "60";

/// Speech-to-text boundary used by the command router.
#[async_trait]
pub trait VoiceTranscriber: Send + Sync {
    /// Fetch the attachment at `url` and return its transcription.
    async fn transcribe(&self, url: &str, filename: &str) -> Result<String>;
}

/// Whisper-backed transcriber.
#[derive(Clone)]
pub struct AudioTranscriber {
    openai_api_key: String,
}

impl AudioTranscriber {
    pub fn new(openai_api_key: String) -> Self {
        AudioTranscriber { openai_api_key }
    }

    /// True when the filename carries a supported audio extension.
    pub fn is_supported(filename: &str) -> bool {
        let lower = filename.to_lowercase();
        SUPPORTED_FORMATS.iter().any(|ext| lower.ends_with(ext))
    }

    /// Send a local file to the Whisper API.
    async fn transcribe_file(&self, file_path: &str) -> Result<String> {
        info!("Transcribing audio file: {file_path}");

        if fs::metadata(file_path).await.is_err() {
            return Err(anyhow::anyhow!("audio file not found: {}", file_path));
        }

        let output = Command::new("curl")
            .args([
                "https://api.openai.com/v1/audio/transcriptions",
                "--max-time",
                UPLOAD_TIMEOUT_SECS,
                "-H",
                &format!("Authorization: Bearer {}", self.openai_api_key),
                "-H",
                "Content-Type: multipart/form-data",
                "-F",
                &format!("file=@{file_path}"),
                "-F",
                "model=whisper-1",
            ])
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("Whisper upload failed: {stderr}");
            return Err(anyhow::anyhow!("transcription upload failed: {}", stderr));
        }

        let response = String::from_utf8(output.stdout)?;
        let json: serde_json::Value = serde_json::from_str(&response)?;

        if let Some(text) = json.get("text").and_then(|t| t.as_str()) {
            info!("Transcription successful, {} characters", text.len());
            Ok(text.to_string())
        } else if let Some(api_error) = json.get("error") {
            error!("Whisper API error: {api_error}");
            Err(anyhow::anyhow!("Whisper API error: {}", api_error))
        } else {
            error!("Unexpected Whisper response: {response}");
            Err(anyhow::anyhow!("unexpected Whisper response format"))
        }
    }
}

#[async_trait]
impl VoiceTranscriber for AudioTranscriber {
    async fn transcribe(&self, url: &str, filename: &str) -> Result<String> {
        if !Self::is_supported(filename) {
            return Err(anyhow::anyhow!("unsupported audio format: {}", filename));
        }

        let temp_file = format!("/tmp/jarvis_audio_{filename}");
        info!("Downloading audio attachment: {filename}");

        let output = Command::new("curl")
            .args(["--max-time", DOWNLOAD_TIMEOUT_SECS, "-o", &temp_file, url])
            .output()?;
        if !output.status.success() {
            return Err(anyhow::anyhow!("failed to download audio attachment"));
        }

        let transcription = self.transcribe_file(&temp_file).await;

        if let Err(e) = fs::remove_file(&temp_file).await {
            warn!("Failed to clean up temp file {temp_file}: {e}");
        }

        transcription
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_formats() {
        assert!(AudioTranscriber::is_supported("voice-message.ogg"));
        assert!(AudioTranscriber::is_supported("note.MP3"));
        assert!(AudioTranscriber::is_supported("clip.m4a"));
    }

    #[test]
    fn test_unsupported_formats() {
        assert!(!AudioTranscriber::is_supported("document.pdf"));
        assert!(!AudioTranscriber::is_supported("song.flac"));
        assert!(!AudioTranscriber::is_supported("noextension"));
    }

    #[tokio::test]
    async fn test_unsupported_format_rejected_before_download() {
        let transcriber = AudioTranscriber::new("test-key".to_string());
        let result = transcriber
            .transcribe("http://localhost/none", "notes.txt")
            .await;
        assert!(result.is_err());
    }
}
