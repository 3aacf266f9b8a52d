//! Bankvoice Widget Library Crate
//!
//! The terminal front-end for the banking chatbot: configuration, reply
//! storage, recording segmentation, and the chat flows (text, voice-file,
//! and live voice over WebSocket). The `widget` binary is a thin wrapper
//! around this library.

pub mod chat;
pub mod config;
pub mod recording;
pub mod store;
pub mod voice;
