//! Controller WebSocket client.
//!
//! [`ControllerConnection`] is the async connection: it performs the hello
//! handshake and exchanges one JSON request for one JSON response.
//! [`RemoteController`] wraps it for the synchronous interpreter, owning a
//! current-thread runtime and blocking on each round trip.
//!
//! # Example
//!
//! ```rust,no_run
//! use claw_ctl::client::{Controller, RemoteController};
//! use claw_ctl_proto::{ControlRequest, ControllerRole};
//!
//! # fn example() -> Result<(), claw_ctl::CliError> {
//! let mut controller = RemoteController::new("ws://localhost:6817", None)?;
//! if controller.ping(ControllerRole::Primary) {
//!     controller.send(ControlRequest::Reconfigure)?;
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use claw_ctl_proto::{ControlRequest, ControlResponse, ControllerRole, CONTROL_PROTOCOL_VERSION};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use crate::error::CliError;

/// Default connection timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can carry a request to the controller.
///
/// Handlers only see this trait, so tests can substitute a recording fake.
pub trait Controller {
    /// Send one request and wait for its response.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Controller`] if the controller rejected the
    /// request, or a connection, timeout or protocol error.
    fn send(&mut self, request: ControlRequest) -> Result<ControlResponse, CliError>;

    /// Whether the controller in `role` answers a ping.
    fn ping(&mut self, role: ControllerRole) -> bool;

    /// Address of the controller in `role`, if one is configured.
    fn address(&self, role: ControllerRole) -> Option<&str>;
}

/// Check that `url` is a WebSocket URL.
///
/// # Errors
///
/// Returns [`CliError::Config`] otherwise.
pub fn validate_url(url: &str) -> Result<(), CliError> {
    if url.starts_with("ws://") || url.starts_with("wss://") {
        Ok(())
    } else {
        Err(CliError::Config(format!(
            "invalid controller URL: {url}, must start with ws:// or wss://"
        )))
    }
}

/// An open, handshaken connection to one controller.
pub struct ControllerConnection {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    server_version: String,
    request_timeout: Duration,
}

impl std::fmt::Debug for ControllerConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerConnection")
            .field("server_version", &self.server_version)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl ControllerConnection {
    /// Connect to the controller at `url` and perform the handshake.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The URL is invalid (must start with `ws://` or `wss://`)
    /// - Connection fails or times out
    /// - Handshake fails
    pub async fn connect(url: &str, connect_timeout: Duration) -> Result<Self, CliError> {
        validate_url(url)?;
        debug!(url = %url, "connecting to controller");

        let (ws, _response) = timeout(connect_timeout, connect_async(url))
            .await
            .map_err(|_| CliError::Timeout(format!("connection to {url} timed out")))?
            .map_err(|e| CliError::Connection(e.to_string()))?;

        let mut conn = Self {
            ws,
            server_version: String::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        };

        let hello = ControlRequest::hello(env!("CARGO_PKG_VERSION"));
        match conn.send_request(hello).await? {
            ControlResponse::Welcome {
                server_version,
                protocol_version,
            } => {
                if protocol_version != CONTROL_PROTOCOL_VERSION {
                    warn!(
                        server = protocol_version,
                        client = CONTROL_PROTOCOL_VERSION,
                        "protocol version mismatch"
                    );
                }
                debug!(version = %server_version, "handshake complete");
                conn.server_version = server_version;
                Ok(conn)
            }
            other => Err(CliError::Protocol(format!(
                "unexpected response to hello: {other:?}"
            ))),
        }
    }

    /// Set the request timeout.
    pub fn set_request_timeout(&mut self, timeout: Duration) {
        self.request_timeout = timeout;
    }

    /// Controller version reported in the handshake.
    #[must_use]
    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    /// Send a request and wait for the response.
    ///
    /// An `error` response is returned as [`CliError::Controller`] with the
    /// request type as context.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails or the controller rejects the
    /// request.
    pub async fn send_request(
        &mut self,
        request: ControlRequest,
    ) -> Result<ControlResponse, CliError> {
        let request_type = request.request_type();
        let json = request.to_json()?;

        trace!(request_type, "sending request");
        self.ws
            .send(Message::Text(json))
            .await
            .map_err(|e| CliError::Connection(e.to_string()))?;

        let message = timeout(self.request_timeout, self.ws.next())
            .await
            .map_err(|_| CliError::Timeout(format!("request '{request_type}' timed out")))?
            .ok_or_else(|| CliError::Connection("connection closed".into()))?
            .map_err(|e| CliError::Connection(e.to_string()))?;

        match message {
            Message::Text(text) => match ControlResponse::from_json(&text)? {
                ControlResponse::Error { code, message } => Err(CliError::Controller {
                    context: request_type.to_string(),
                    code,
                    message,
                }),
                response => {
                    trace!(request_type, "received response");
                    Ok(response)
                }
            },
            Message::Binary(_) => Err(CliError::Protocol("unexpected binary message".into())),
            Message::Close(_) => Err(CliError::Connection("connection closed by controller".into())),
            _ => Err(CliError::Protocol("unexpected message type".into())),
        }
    }

    /// Close the connection gracefully.
    ///
    /// # Errors
    ///
    /// Returns an error if the close frame cannot be sent.
    pub async fn close(mut self) -> Result<(), CliError> {
        self.ws
            .close(None)
            .await
            .map_err(|e| CliError::Connection(e.to_string()))
    }
}

/// Blocking controller client used by the interpreter.
///
/// Connects lazily to the primary on the first request and keeps the
/// connection until it fails; the next request reconnects. Pings always use
/// a fresh connection to the addressed controller.
pub struct RemoteController {
    runtime: Runtime,
    primary: String,
    backup: Option<String>,
    connect_timeout: Duration,
    request_timeout: Duration,
    conn: Option<ControllerConnection>,
}

impl std::fmt::Debug for RemoteController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteController")
            .field("primary", &self.primary)
            .field("backup", &self.backup)
            .field("connected", &self.conn.is_some())
            .finish_non_exhaustive()
    }
}

impl RemoteController {
    /// Create a client for the given controllers. Nothing is connected yet.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL is not a WebSocket URL or the runtime
    /// cannot be built.
    pub fn new(primary: impl Into<String>, backup: Option<String>) -> Result<Self, CliError> {
        let primary = primary.into();
        validate_url(&primary)?;
        if let Some(url) = &backup {
            validate_url(url)?;
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            runtime,
            primary,
            backup,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            conn: None,
        })
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl Controller for RemoteController {
    fn send(&mut self, request: ControlRequest) -> Result<ControlResponse, CliError> {
        let mut conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                let mut conn = self
                    .runtime
                    .block_on(ControllerConnection::connect(&self.primary, self.connect_timeout))?;
                conn.set_request_timeout(self.request_timeout);
                conn
            }
        };
        let result = self.runtime.block_on(conn.send_request(request));
        match &result {
            // A rejected request leaves the connection usable.
            Ok(_) | Err(CliError::Controller { .. }) => self.conn = Some(conn),
            Err(e) => debug!(error = %e, "dropping controller connection"),
        }
        result
    }

    fn ping(&mut self, role: ControllerRole) -> bool {
        let Some(url) = self.address(role).map(str::to_owned) else {
            return false;
        };
        let connect_timeout = self.connect_timeout;
        let request_timeout = self.request_timeout;
        let result = self.runtime.block_on(async move {
            let mut conn = ControllerConnection::connect(&url, connect_timeout).await?;
            conn.set_request_timeout(request_timeout);
            let response = conn.send_request(ControlRequest::ping(role)).await?;
            if let Err(e) = conn.close().await {
                trace!(error = %e, "close after ping failed");
            }
            Ok::<_, CliError>(response)
        });
        match result {
            Ok(ControlResponse::Pong { .. }) => true,
            Ok(other) => {
                debug!(?role, response = ?other, "unexpected ping response");
                false
            }
            Err(e) => {
                debug!(?role, error = %e, "ping failed");
                false
            }
        }
    }

    fn address(&self, role: ControllerRole) -> Option<&str> {
        match role {
            ControllerRole::Primary => Some(&self.primary),
            ControllerRole::Backup => self.backup.as_deref(),
        }
    }
}

/// Recording controller for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct FakeController {
    /// Every request sent, in order.
    pub requests: Vec<ControlRequest>,
    responses: std::collections::VecDeque<Result<ControlResponse, CliError>>,
    /// Ping answer for the primary.
    pub primary_up: bool,
    /// Ping answer for the backup.
    pub backup_up: bool,
    /// Roles pinged, in order.
    pub pinged: Vec<ControllerRole>,
}

#[cfg(test)]
impl FakeController {
    /// A fake that acknowledges everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next request.
    #[must_use]
    pub fn respond(mut self, response: Result<ControlResponse, CliError>) -> Self {
        self.responses.push_back(response);
        self
    }
}

#[cfg(test)]
impl Controller for FakeController {
    fn send(&mut self, request: ControlRequest) -> Result<ControlResponse, CliError> {
        self.requests.push(request);
        self.responses.pop_front().unwrap_or(Ok(ControlResponse::Ack))
    }

    fn ping(&mut self, role: ControllerRole) -> bool {
        self.pinged.push(role);
        match role {
            ControllerRole::Primary => self.primary_up,
            ControllerRole::Backup => self.backup_up,
        }
    }

    fn address(&self, role: ControllerRole) -> Option<&str> {
        match role {
            ControllerRole::Primary => Some("ws://primary.test:6817"),
            ControllerRole::Backup => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claw_ctl_proto::{ErrorCode, JobId};
    use tokio::net::TcpListener;

    /// Accept one client, answer the hello, then answer each request with
    /// the next canned response.
    async fn serve_once(listener: TcpListener, replies: Vec<ControlResponse>) {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let welcome = ControlResponse::Welcome {
            server_version: "test".into(),
            protocol_version: CONTROL_PROTOCOL_VERSION,
        };
        for reply in std::iter::once(welcome).chain(replies) {
            let Some(Ok(Message::Text(_))) = ws.next().await else {
                return;
            };
            ws.send(Message::Text(reply.to_json().unwrap())).await.unwrap();
        }
    }

    #[test]
    fn validate_url_schemes() {
        assert!(validate_url("ws://host:1").is_ok());
        assert!(validate_url("wss://host").is_ok());
        let err = validate_url("http://host").unwrap_err();
        assert!(err.to_string().contains("invalid controller URL"));
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let err = ControllerConnection::connect("http://invalid", DEFAULT_CONNECT_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_or_timeout() {
        let result =
            ControllerConnection::connect("ws://10.255.255.1:9999", Duration::from_millis(100))
                .await;
        assert!(result.unwrap_err().is_controller_failure());
    }

    #[tokio::test]
    async fn test_handshake_and_error_mapping() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(serve_once(
            listener,
            vec![
                ControlResponse::Ack,
                ControlResponse::Error {
                    code: ErrorCode::InvalidJobId,
                    message: "job 9".into(),
                },
            ],
        ));

        let mut conn = ControllerConnection::connect(&url, DEFAULT_CONNECT_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(conn.server_version(), "test");
        assert_eq!(
            conn.send_request(ControlRequest::Reconfigure).await.unwrap(),
            ControlResponse::Ack
        );
        let err = conn
            .send_request(ControlRequest::Requeue {
                job_id: JobId::new(9),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "requeue error: Invalid job id specified");
        server.await.unwrap();
    }

    #[test]
    fn remote_controller_rejects_bad_backup_url() {
        let err = RemoteController::new("ws://localhost:1", Some("tcp://x".into())).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn remote_controller_missing_backup_is_down() {
        let mut controller = RemoteController::new("ws://127.0.0.1:1", None)
            .unwrap()
            .with_connect_timeout(Duration::from_millis(200));
        assert_eq!(controller.address(ControllerRole::Backup), None);
        assert_eq!(controller.address(ControllerRole::Primary), Some("ws://127.0.0.1:1"));
        assert!(!controller.ping(ControllerRole::Backup));
    }

    #[test]
    fn remote_controller_unreachable_primary() {
        let mut controller = RemoteController::new("ws://127.0.0.1:1", None)
            .unwrap()
            .with_connect_timeout(Duration::from_millis(200));
        assert!(!controller.ping(ControllerRole::Primary));
        let err = controller.send(ControlRequest::Reconfigure).unwrap_err();
        assert!(err.is_controller_failure());
    }

    #[test]
    fn fake_controller_records_and_replays() {
        let mut fake = FakeController::new().respond(Ok(ControlResponse::Records {
            records: vec![],
        }));
        fake.primary_up = true;
        assert!(matches!(
            fake.send(ControlRequest::ListCompleting),
            Ok(ControlResponse::Records { .. })
        ));
        assert_eq!(fake.send(ControlRequest::Reconfigure).unwrap(), ControlResponse::Ack);
        assert_eq!(fake.requests.len(), 2);
        assert!(fake.ping(ControllerRole::Primary));
        assert!(!fake.ping(ControllerRole::Backup));
    }
}
