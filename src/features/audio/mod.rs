//! # Audio Feature
//!
//! Whisper-powered transcription of voice messages and audio
//! attachments.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true

pub mod transcriber;

pub use transcriber::{AudioTranscriber, VoiceTranscriber};
