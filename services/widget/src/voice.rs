//! The live voice flow: one WebSocket session per exchange.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use bankvoice_core::audio;
use bankvoice_session::{InboundFrame, SessionError, VoiceChatSession};
use tracing::{info, warn};

use crate::recording::segment_recording;
use crate::store::ReplyStore;

/// What one live exchange produced.
#[derive(Debug, Default)]
pub struct VoiceExchange {
    /// Textual replies, in arrival order.
    pub replies: Vec<String>,
    /// Stored spoken replies, in arrival order.
    pub saved_audio: Vec<PathBuf>,
    /// Malformed frames that were skipped.
    pub protocol_errors: usize,
    /// Whether the connection was lost before the exchange finished.
    pub connection_lost: bool,
}

/// Streams a recording through the voice session and collects replies.
///
/// Each bounded window of the recording becomes exactly one binary frame.
/// Inbound frames are then drained until the server closes the session or
/// stays quiet for `idle`.
pub async fn run_live_exchange(
    session: &mut VoiceChatSession,
    store: &mut ReplyStore,
    customer_id: &str,
    recording: &[u8],
    window_secs: u64,
    idle: Duration,
) -> Result<VoiceExchange> {
    let segments = segment_recording(recording, window_secs)?;
    info!(segments = segments.len(), "starting live voice exchange");

    session.start(customer_id).await?;
    for segment in segments {
        session.send_audio(segment).await?;
    }

    let mut exchange = VoiceExchange::default();
    loop {
        let frame = match tokio::time::timeout(idle, session.next_frame()).await {
            Err(_) => {
                info!("no further replies; ending the voice exchange");
                break;
            }
            Ok(None) => break,
            Ok(Some(frame)) => frame,
        };
        match frame {
            Ok(InboundFrame::Text(reply)) => {
                if let Some(encoded) = &reply.audio {
                    match audio::decode_inline_audio(encoded) {
                        Ok(bytes) => exchange.saved_audio.push(store.save(&bytes)?),
                        // Degraded reply: keep the text, skip the audio.
                        Err(e) => {
                            warn!(error = %e, "reply carried undecodable inline audio");
                            exchange.protocol_errors += 1;
                        }
                    }
                }
                if let Some(url) = &reply.audio_url {
                    info!(url = %url, "reply audio available by reference");
                }
                exchange.replies.push(reply.response);
            }
            Ok(InboundFrame::Audio(bytes)) => {
                exchange.saved_audio.push(store.save(&bytes)?);
            }
            Err(err @ SessionError::Protocol(_)) => {
                warn!(error = %err, "skipping malformed frame");
                exchange.protocol_errors += 1;
            }
            Err(err) => {
                warn!(error = %err, "voice connection lost");
                exchange.connection_lost = true;
                break;
            }
        }
    }
    session.stop().await;
    Ok(exchange)
}
