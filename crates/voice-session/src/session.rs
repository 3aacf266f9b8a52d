//! Manages one voice chat connection's lifecycle and message dispatch.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::protocol::Message as WsMessage,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::protocol::{self, InboundFrame};

type WsConnection = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Errors reported by a [`VoiceChatSession`].
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The handshake failed, or an open connection was lost.
    #[error("connection failed: {0}")]
    Connection(String),
    /// A frame arrived but did not match the inbound wire contract.
    #[error("malformed text frame: {0}")]
    Protocol(String),
    /// An operation was invoked in a state that does not permit it.
    #[error("invalid session state: {0}")]
    State(String),
}

/// Lifecycle states of a session.
///
/// `Closed` is terminal for the current connection but re-enterable via a
/// fresh [`VoiceChatSession::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Open,
    Closed,
}

/// One customer's voice chat interaction, bound to at most one open
/// WebSocket connection at a time.
///
/// The session owns its connection handle and state outright and is pumped
/// by the caller; sends ([`send_audio`]) and receives ([`next_frame`]) are
/// composed with `tokio::select!` when full-duplex behavior is needed.
///
/// [`send_audio`]: VoiceChatSession::send_audio
/// [`next_frame`]: VoiceChatSession::next_frame
pub struct VoiceChatSession {
    endpoint: Url,
    state: SessionState,
    conn: Option<WsConnection>,
}

impl VoiceChatSession {
    /// Creates an idle session that will connect to `endpoint`.
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            state: SessionState::Idle,
            conn: None,
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Opens the connection, passing `customer_id` as a query parameter.
    ///
    /// Returns once the handshake completes. On failure the session is left
    /// `Closed` with no connection open. Starting an already connecting or
    /// open session is a state error and leaves the live connection
    /// untouched; an empty customer id is rejected before any connection
    /// attempt.
    pub async fn start(&mut self, customer_id: &str) -> Result<(), SessionError> {
        if customer_id.is_empty() {
            return Err(SessionError::State(
                "start requires a non-empty customer id".to_string(),
            ));
        }
        if matches!(self.state, SessionState::Connecting | SessionState::Open) {
            return Err(SessionError::State(format!(
                "start called while the session is {:?}",
                self.state
            )));
        }

        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("customer_id", customer_id);

        self.state = SessionState::Connecting;
        match connect_async(url.as_str()).await {
            Ok((conn, _response)) => {
                info!(customer_id, "voice session established");
                self.conn = Some(conn);
                self.state = SessionState::Open;
                Ok(())
            }
            Err(e) => {
                warn!(customer_id, error = %e, "voice session handshake failed");
                self.state = SessionState::Closed;
                Err(SessionError::Connection(e.to_string()))
            }
        }
    }

    /// Transmits one finished recording segment as a single binary frame.
    ///
    /// Fire-and-forget: no acknowledgement is awaited, and delivery failure
    /// only surfaces through the connection's own error/close. Calling this
    /// outside the `Open` state is a state error and transmits nothing.
    pub async fn send_audio(&mut self, segment: impl Into<Vec<u8>>) -> Result<(), SessionError> {
        if self.state != SessionState::Open {
            return Err(SessionError::State(format!(
                "send_audio called while the session is {:?}",
                self.state
            )));
        }
        let Some(conn) = self.conn.as_mut() else {
            return Err(SessionError::State(
                "send_audio called with no open connection".to_string(),
            ));
        };
        let payload = segment.into();
        debug!(len = payload.len(), "sending audio segment");
        let sent = conn.send(WsMessage::Binary(payload)).await;
        if let Err(e) = sent {
            self.drop_connection();
            return Err(SessionError::Connection(e.to_string()));
        }
        Ok(())
    }

    /// Resolves to the next inbound frame, in arrival order.
    ///
    /// A text frame that fails to parse yields a recoverable
    /// [`SessionError::Protocol`] without closing the connection. Transport
    /// loss is surfaced exactly once as [`SessionError::Connection`]; after
    /// that, and after a clean close from either side, this returns `None`
    /// and the session is `Closed`.
    pub async fn next_frame(&mut self) -> Option<Result<InboundFrame, SessionError>> {
        loop {
            let conn = self.conn.as_mut()?;
            match conn.next().await {
                Some(Ok(WsMessage::Close(frame))) => {
                    info!(?frame, "server closed the voice session");
                    self.drop_connection();
                    return None;
                }
                Some(Ok(msg)) => match protocol::decode_frame(msg) {
                    Some(result) => return Some(result),
                    // Control frame; keep reading.
                    None => continue,
                },
                Some(Err(e)) => {
                    warn!(error = %e, "voice connection lost");
                    self.drop_connection();
                    return Some(Err(SessionError::Connection(e.to_string())));
                }
                None => {
                    self.drop_connection();
                    return None;
                }
            }
        }
    }

    /// Pumps inbound frames until the connection closes.
    ///
    /// `on_frame` is invoked once per inbound frame; `on_error` receives
    /// each recoverable protocol error and, at most once, the connection
    /// loss that ends the pump.
    pub async fn dispatch<F, E>(&mut self, mut on_frame: F, mut on_error: E)
    where
        F: FnMut(InboundFrame),
        E: FnMut(SessionError),
    {
        while let Some(result) = self.next_frame().await {
            match result {
                Ok(frame) => on_frame(frame),
                Err(err @ SessionError::Protocol(_)) => on_error(err),
                Err(err) => {
                    on_error(err);
                    break;
                }
            }
        }
    }

    /// Closes the connection if one is open. Idempotent.
    pub async fn stop(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            // Best-effort close handshake; the connection is gone either way.
            if let Err(e) = conn.close(None).await {
                debug!(error = %e, "close handshake failed");
            }
            info!("voice session closed");
        }
        if matches!(self.state, SessionState::Connecting | SessionState::Open) {
            self.state = SessionState::Closed;
        }
    }

    fn drop_connection(&mut self) {
        self.conn = None;
        self.state = SessionState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Url {
        Url::parse("ws://127.0.0.1:1/voice").unwrap()
    }

    #[test]
    fn new_session_is_idle() {
        let session = VoiceChatSession::new(endpoint());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn start_rejects_empty_customer_id_without_connecting() {
        let mut session = VoiceChatSession::new(endpoint());
        let err = session.start("").await.unwrap_err();
        assert!(matches!(err, SessionError::State(_)));
        // No connection attempt was made, so the session is still idle.
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn start_failure_leaves_session_closed() {
        // Port 1 refuses the TCP connection outright.
        let mut session = VoiceChatSession::new(endpoint());
        let err = session.start("cust-1").await.unwrap_err();
        assert!(matches!(err, SessionError::Connection(_)));
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn send_audio_outside_open_is_a_state_error() {
        let mut session = VoiceChatSession::new(endpoint());
        let err = session.send_audio(vec![1, 2, 3]).await.unwrap_err();
        assert!(matches!(err, SessionError::State(_)));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn stop_on_idle_session_is_a_no_op() {
        let mut session = VoiceChatSession::new(endpoint());
        session.stop().await;
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn stop_after_failed_start_is_idempotent() {
        let mut session = VoiceChatSession::new(endpoint());
        let _ = session.start("cust-1").await;
        assert_eq!(session.state(), SessionState::Closed);
        session.stop().await;
        session.stop().await;
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn next_frame_before_start_yields_nothing() {
        let mut session = VoiceChatSession::new(endpoint());
        assert!(session.next_frame().await.is_none());
    }
}
