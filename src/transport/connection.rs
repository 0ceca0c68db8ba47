//! WebSocket connection to one Engine app session.
//!
//! A [`Connection`] wraps exactly one socket opened against one app. It is
//! split into a [`ConnectionWriter`] (outbound frames, id generation,
//! closing) and a [`ConnectionReader`] (inbound text frames), which the
//! engine drives concurrently inside a single scrape.
//!
//! # Lifecycle
//!
//! 1. `Connection::open` - WebSocket handshake, session cookie attached
//! 2. `Connection::split` - hand halves to receiver and workflow engine
//! 3. `ConnectionWriter::close` - sends a close frame and releases the reader
//! 4. Dropping both halves tears the socket down

// ============================================================================
// Imports
// ============================================================================

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::to_string;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::{IdGenerator, RequestId};
use crate::protocol::Request;

// ============================================================================
// Types
// ============================================================================

/// Client-side socket to the engine.
pub type EngineStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// Connection
// ============================================================================

/// One WebSocket scoped to one app session.
pub struct Connection {
    writer: ConnectionWriter,
    reader: ConnectionReader,
}

impl Connection {
    /// Opens a socket to `url`, sending `cookie` as the `Cookie` header.
    ///
    /// # Errors
    ///
    /// - [`Error::Authentication`] if the cookie is not a valid header value
    /// - [`Error::Connection`] if the handshake fails
    /// - [`Error::WebSocket`] if `url` cannot form a handshake request
    pub async fn open(url: &Url, cookie: Option<&str>) -> Result<Self> {
        let mut request = url.as_str().into_client_request()?;

        if let Some(cookie) = cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| Error::authentication(format!("invalid session cookie: {e}")))?;
            request.headers_mut().insert(COOKIE, value);
        }

        let (ws_stream, response) = connect_async(request)
            .await
            .map_err(|e| Error::connection(format!("WebSocket handshake with {url} failed: {e}")))?;

        debug!(status = %response.status(), "WebSocket handshake completed");
        info!(%url, "Engine connection established");

        Ok(Self::new(ws_stream))
    }

    /// Wraps an established stream.
    pub(crate) fn new(ws_stream: EngineStream) -> Self {
        let (sink, stream) = ws_stream.split();
        let (closed_tx, closed_rx) = oneshot::channel();

        Self {
            writer: ConnectionWriter {
                sink,
                ids: IdGenerator::new(),
                closed_tx: Some(closed_tx),
            },
            reader: ConnectionReader {
                stream,
                closed_rx,
                finished: false,
            },
        }
    }

    /// Splits into independently driven halves.
    #[must_use]
    pub fn split(self) -> (ConnectionWriter, ConnectionReader) {
        (self.writer, self.reader)
    }
}

// ============================================================================
// ConnectionWriter
// ============================================================================

/// Outbound half: serializes requests and owns the id generator.
pub struct ConnectionWriter {
    sink: SplitSink<EngineStream, Message>,
    ids: IdGenerator,
    /// Fired once the local side has closed.
    closed_tx: Option<oneshot::Sender<()>>,
}

impl ConnectionWriter {
    /// Returns the next request id (strictly increasing, starts at 1).
    #[inline]
    #[must_use]
    pub fn next_id(&self) -> RequestId {
        self.ids.next_id()
    }

    /// Returns how many ids this connection has issued.
    #[inline]
    #[must_use]
    pub fn ids_issued(&self) -> u64 {
        self.ids.issued()
    }

    /// Serializes and transmits one request.
    ///
    /// The caller registers `request.id` as pending before calling this.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if serialization fails
    /// - [`Error::WebSocket`] if the frame cannot be written
    pub async fn send(&mut self, request: &Request) -> Result<()> {
        let json = to_string(request)?;
        self.sink.send(Message::Text(json.into())).await?;

        trace!(request_id = %request.id, method = %request.method, handle = %request.handle, "Request sent");
        Ok(())
    }

    /// Sends a close frame and tells the reader to stop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WebSocket`] if the close frame cannot be written.
    /// The reader is released either way.
    pub async fn close(&mut self) -> Result<()> {
        let result = self.sink.close().await;

        if let Some(closed_tx) = self.closed_tx.take() {
            let _ = closed_tx.send(());
        }

        debug!("Local side closed the connection");
        result.map_err(Error::from)
    }
}

// ============================================================================
// ConnectionReader
// ============================================================================

/// Inbound half: yields text frames until the socket closes.
pub struct ConnectionReader {
    stream: SplitStream<EngineStream>,
    closed_rx: oneshot::Receiver<()>,
    finished: bool,
}

impl ConnectionReader {
    /// Waits for the next text frame.
    ///
    /// Returns `None` once the socket is closed by either side or fails.
    /// Control frames and binary frames are skipped.
    pub async fn next_frame(&mut self) -> Option<String> {
        while !self.finished {
            tokio::select! {
                biased;

                message = self.stream.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => return Some(text.as_str().to_owned()),

                        Some(Ok(Message::Close(frame))) => {
                            debug!(?frame, "WebSocket closed by engine");
                            self.finished = true;
                        }

                        Some(Ok(Message::Binary(bytes))) => {
                            debug!(len = bytes.len(), "Ignoring binary frame");
                        }

                        // Ping, Pong, raw frames
                        Some(Ok(_)) => {}

                        Some(Err(e)) => {
                            debug!(error = %e, "WebSocket stream failed");
                            self.finished = true;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            self.finished = true;
                        }
                    }
                }

                // Resolves on close() or when the writer is dropped.
                _ = &mut self.closed_rx => {
                    debug!("Reader released after local close");
                    self.finished = true;
                }
            }
        }

        None
    }
}

// ============================================================================
// Tests
// ============================================================================
