//! Defines the inbound half of the voice WebSocket wire contract.

use bytes::Bytes;
use serde::Deserialize;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;

use crate::session::SessionError;

/// The payload of an inbound text frame.
///
/// The backend always includes `response`; inline audio (base64) or an
/// audio URL may accompany it, depending on how the deployment delivers
/// speech output.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct BotReply {
    /// The bot's textual answer.
    pub response: String,
    /// Base64-encoded audio rendering of the answer, if delivered inline.
    #[serde(default)]
    pub audio: Option<String>,
    /// A URL the audio rendering can be fetched from, if delivered by reference.
    #[serde(default)]
    pub audio_url: Option<String>,
}

/// One inbound message, discriminated by its wire-level frame type.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// A parsed text frame.
    Text(BotReply),
    /// A binary frame of raw audio bytes, passed through unmodified.
    Audio(Bytes),
}

impl InboundFrame {
    /// The bot's textual answer, if this is a text frame.
    pub fn response(&self) -> Option<&str> {
        match self {
            InboundFrame::Text(reply) => Some(&reply.response),
            InboundFrame::Audio(_) => None,
        }
    }
}

/// Decodes one data message into an [`InboundFrame`].
///
/// Returns `None` for control frames, which carry no application payload.
/// Close frames are handled by the session loop and never reach this
/// function.
pub(crate) fn decode_frame(msg: WsMessage) -> Option<Result<InboundFrame, SessionError>> {
    match msg {
        WsMessage::Text(text) => match serde_json::from_str::<BotReply>(&text) {
            Ok(reply) => Some(Ok(InboundFrame::Text(reply))),
            Err(e) => Some(Err(SessionError::Protocol(format!(
                "text frame is not a valid reply object: {e}"
            )))),
        },
        WsMessage::Binary(data) => Some(Ok(InboundFrame::Audio(Bytes::from(data)))),
        _ => None,
    }
}
