//! Typed clients for the banking backend's HTTP endpoints.
//!
//! The endpoints themselves are opaque collaborators; this module only pins
//! down their request/reply shapes and turns contract violations into
//! errors instead of placeholder strings.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audio;

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    customer_id: &'a str,
    message: &'a str,
}

/// A reply from the chat endpoint.
///
/// `response` is mandatory; a deployment may additionally deliver a spoken
/// rendering inline (base64) or by reference.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub audio: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
}

impl ChatReply {
    /// The spoken rendering of the reply, if the backend delivered one.
    ///
    /// Inline audio that fails to decode is an error; a reply without any
    /// audio is simply `None`.
    pub fn speech(&self) -> Result<Option<SpeechAudio>> {
        if let Some(encoded) = &self.audio {
            let bytes = audio::decode_inline_audio(encoded)
                .context("chat reply carried undecodable inline audio")?;
            return Ok(Some(SpeechAudio::Inline(bytes)));
        }
        Ok(self.audio_url.clone().map(SpeechAudio::Url))
    }
}

#[derive(Deserialize, Debug)]
struct SttReply {
    transcription: String,
}

#[derive(Deserialize, Debug)]
struct TtsReply {
    #[serde(default)]
    audio: Option<String>,
    #[serde(default)]
    audio_url: Option<String>,
}

impl TtsReply {
    fn into_speech(self) -> Result<SpeechAudio> {
        if let Some(encoded) = self.audio {
            let bytes = audio::decode_inline_audio(&encoded)
                .context("tts endpoint returned undecodable inline audio")?;
            return Ok(SpeechAudio::Inline(bytes));
        }
        match self.audio_url {
            Some(url) => Ok(SpeechAudio::Url(url)),
            None => bail!("tts endpoint returned neither inline audio nor an audio url"),
        }
    }
}

/// Speech output, either delivered inline or by reference.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechAudio {
    Inline(Vec<u8>),
    Url(String),
}

/// A client for the banking chatbot backend.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Sends one chat message on behalf of a customer and returns the
    /// bot's reply.
    async fn send_message(&self, customer_id: &str, message: &str) -> Result<ChatReply>;

    /// Uploads one finished recording and returns its transcription.
    async fn transcribe(&self, recording: Vec<u8>) -> Result<String>;

    /// Asks the backend to render `text` as speech.
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio>;
}

/// The production [`BackendClient`] speaking HTTP to a deployed backend.
pub struct HttpBackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn send_message(&self, customer_id: &str, message: &str) -> Result<ChatReply> {
        debug!(customer_id, "sending chat message");
        let response = self
            .http
            .post(self.endpoint("chat"))
            .json(&ChatRequest {
                customer_id,
                message,
            })
            .send()
            .await
            .context("chat request failed")?
            .error_for_status()
            .context("chat endpoint rejected the request")?;
        response
            .json::<ChatReply>()
            .await
            .context("chat reply was not the expected JSON object")
    }

    async fn transcribe(&self, recording: Vec<u8>) -> Result<String> {
        debug!(len = recording.len(), "uploading recording for transcription");
        let part = reqwest::multipart::Part::bytes(recording)
            .file_name("recording.wav")
            .mime_str("audio/wav")
            .context("building the recording upload")?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .http
            .post(self.endpoint("stt"))
            .multipart(form)
            .send()
            .await
            .context("stt request failed")?
            .error_for_status()
            .context("stt endpoint rejected the upload")?;
        let reply: SttReply = response
            .json()
            .await
            .context("stt reply was not the expected JSON object")?;
        Ok(reply.transcription)
    }

    async fn synthesize(&self, text: &str) -> Result<SpeechAudio> {
        let response = self
            .http
            .post(self.endpoint("tts"))
            .form(&[("text", text)])
            .send()
            .await
            .context("tts request failed")?
            .error_for_status()
            .context("tts endpoint rejected the request")?;
        let reply: TtsReply = response
            .json()
            .await
            .context("tts reply was not the expected JSON object")?;
        reply.into_speech()
    }
}
