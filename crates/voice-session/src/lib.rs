//! Client-side voice chat session for the banking chatbot backend.
//!
//! A [`VoiceChatSession`] owns one bidirectional WebSocket connection and
//! multiplexes two message kinds in both directions: JSON text frames
//! carrying the bot's reply, and binary frames carrying raw audio bytes.
//! The wire-level frame type is the only discriminant, and it is inspected
//! exactly once at the transport boundary; downstream code only ever sees
//! the tagged [`InboundFrame`].

pub mod protocol;
pub mod session;

pub use protocol::{BotReply, InboundFrame};
pub use session::{SessionError, SessionState, VoiceChatSession};
