//! The HTTP chat flows: text turns and voice-file turns.
//!
//! The original widget chained these endpoint calls inside transport
//! callbacks; here they compose as sequential awaited calls with one
//! result value per turn.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bankvoice_core::backend::{BackendClient, SpeechAudio};
use tracing::info;

use crate::store::ReplyStore;

/// The outcome of one exchange with the chat endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    /// What the recording transcribed to, for voice-file turns.
    pub transcription: Option<String>,
    /// The bot's textual answer.
    pub response: String,
    /// Where the spoken reply was stored, when delivered inline.
    pub saved_audio: Option<PathBuf>,
    /// A reference to the spoken reply, when delivered by URL.
    pub audio_url: Option<String>,
}

/// Sends one text message and collects the reply.
///
/// With `speak` set, a reply that carries no audio of its own is run
/// through the TTS endpoint.
pub async fn run_text_turn(
    backend: &dyn BackendClient,
    store: &mut ReplyStore,
    customer_id: &str,
    message: &str,
    speak: bool,
) -> Result<ChatTurn> {
    let reply = backend.send_message(customer_id, message).await?;
    info!(customer_id, "chat reply received");

    let mut speech = reply.speech()?;
    if speech.is_none() && speak {
        speech = Some(
            backend
                .synthesize(&reply.response)
                .await
                .context("speech synthesis for the reply failed")?,
        );
    }

    let mut turn = ChatTurn {
        transcription: None,
        response: reply.response,
        saved_audio: None,
        audio_url: None,
    };
    match speech {
        Some(SpeechAudio::Inline(bytes)) => turn.saved_audio = Some(store.save(&bytes)?),
        Some(SpeechAudio::Url(url)) => turn.audio_url = Some(url),
        None => {}
    }
    Ok(turn)
}

/// Transcribes a finished recording, then runs the transcription through
/// the text flow.
pub async fn run_voice_file_turn(
    backend: &dyn BackendClient,
    store: &mut ReplyStore,
    customer_id: &str,
    recording: Vec<u8>,
    speak: bool,
) -> Result<ChatTurn> {
    let transcription = backend.transcribe(recording).await?;
    info!(customer_id, transcription = %transcription, "recording transcribed");
    let mut turn = run_text_turn(backend, store, customer_id, &transcription, speak).await?;
    turn.transcription = Some(transcription);
    Ok(turn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bankvoice_core::backend::ChatReply;
    use base64::Engine;
    use mockall::mock;

    mock! {
        Backend {}

        #[async_trait]
        impl BackendClient for Backend {
            async fn send_message(&self, customer_id: &str, message: &str)
                -> anyhow::Result<ChatReply>;
            async fn transcribe(&self, recording: Vec<u8>) -> anyhow::Result<String>;
            async fn synthesize(&self, text: &str) -> anyhow::Result<SpeechAudio>;
        }
    }

    fn store() -> (tempfile::TempDir, ReplyStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ReplyStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn text_turn_stores_inline_reply_audio() {
        let mut backend = MockBackend::new();
        backend
            .expect_send_message()
            .withf(|id, msg| id == "cust-1" && msg == "what is my balance")
            .returning(|_, _| {
                Ok(ChatReply {
                    response: "Your balance is $100".to_string(),
                    audio: Some(
                        base64::engine::general_purpose::STANDARD.encode([1u8, 2, 3]),
                    ),
                    audio_url: None,
                })
            });

        let (_dir, mut store) = store();
        let turn = run_text_turn(&backend, &mut store, "cust-1", "what is my balance", false)
            .await
            .unwrap();

        assert_eq!(turn.response, "Your balance is $100");
        assert_eq!(turn.transcription, None);
        assert_eq!(turn.audio_url, None);
        let saved = turn.saved_audio.expect("inline audio should be stored");
        assert_eq!(std::fs::read(saved).unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn speak_falls_back_to_tts_when_the_reply_is_text_only() {
        let mut backend = MockBackend::new();
        backend.expect_send_message().returning(|_, _| {
            Ok(ChatReply {
                response: "Done".to_string(),
                audio: None,
                audio_url: None,
            })
        });
        backend
            .expect_synthesize()
            .withf(|text| text == "Done")
            .returning(|_| Ok(SpeechAudio::Url("https://bank.example.com/r.wav".to_string())));

        let (_dir, mut store) = store();
        let turn = run_text_turn(&backend, &mut store, "cust-1", "transfer $5", true)
            .await
            .unwrap();

        assert_eq!(turn.saved_audio, None);
        assert_eq!(
            turn.audio_url.as_deref(),
            Some("https://bank.example.com/r.wav")
        );
    }

    #[tokio::test]
    async fn without_speak_a_text_only_reply_stays_text_only() {
        let mut backend = MockBackend::new();
        backend.expect_send_message().returning(|_, _| {
            Ok(ChatReply {
                response: "Done".to_string(),
                audio: None,
                audio_url: None,
            })
        });
        // No synthesize expectation: calling it would fail the test.

        let (_dir, mut store) = store();
        let turn = run_text_turn(&backend, &mut store, "cust-1", "hi", false)
            .await
            .unwrap();

        assert_eq!(turn.saved_audio, None);
        assert_eq!(turn.audio_url, None);
    }

    #[tokio::test]
    async fn voice_file_turn_feeds_the_transcription_into_the_chat() {
        let mut backend = MockBackend::new();
        backend
            .expect_transcribe()
            .withf(|recording| recording == b"fake wav bytes")
            .returning(|_| Ok("what is my balance".to_string()));
        backend
            .expect_send_message()
            .withf(|_, msg| msg == "what is my balance")
            .returning(|_, _| {
                Ok(ChatReply {
                    response: "Your balance is $100".to_string(),
                    audio: None,
                    audio_url: None,
                })
            });

        let (_dir, mut store) = store();
        let turn = run_voice_file_turn(
            &backend,
            &mut store,
            "cust-1",
            b"fake wav bytes".to_vec(),
            false,
        )
        .await
        .unwrap();

        assert_eq!(turn.transcription.as_deref(), Some("what is my balance"));
        assert_eq!(turn.response, "Your balance is $100");
    }
}
