//! Relay task owning the upstream broker link.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use crate::adapters::broker::BrokerLinkProvider;
use crate::application::ErrorDispatcher;
use crate::config::RelayConfig;
use crate::domain::failure::{ClientContext, RelayFailure};
use crate::domain::stomp::{encode, headers, FrameError, StompCommand, StompDecoder, StompFrame};
use crate::ports::OutboundChannel;

use super::correlation;
use super::subscriptions::SubscriptionTable;

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Work handed to the relay task.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayCommand {
    /// A client frame to forward upstream. Must carry a session id.
    Frame(StompFrame),
    /// The session disconnected; drop whatever it left subscribed.
    SessionClosed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("Broker relay is unavailable")]
    Unavailable,
}

impl From<RelayError> for RelayFailure {
    fn from(err: RelayError) -> Self {
        RelayFailure::other(err.to_string())
    }
}

/// Cheap cloneable sender side of the relay task.
#[derive(Debug, Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<RelayCommand>,
}

impl RelayHandle {
    pub fn new(tx: mpsc::Sender<RelayCommand>) -> Self {
        Self { tx }
    }

    pub async fn forward(&self, frame: StompFrame) -> Result<(), RelayError> {
        self.tx
            .send(RelayCommand::Frame(frame))
            .await
            .map_err(|_| RelayError::Unavailable)
    }

    pub async fn session_closed(&self, session_id: impl Into<String>) {
        let session_id = session_id.into();
        if self
            .tx
            .send(RelayCommand::SessionClosed(session_id.clone()))
            .await
            .is_err()
        {
            tracing::debug!(%session_id, "Relay stopped before session cleanup");
        }
    }
}

enum LinkOutcome {
    Shutdown,
    Lost(String),
}

/// Owns the upstream link: connects, authenticates with the system
/// credentials, pumps frames both ways and reconnects on loss.
pub struct BrokerRelay {
    provider: Arc<BrokerLinkProvider>,
    config: RelayConfig,
    passcode: SecretString,
    outbound: Arc<dyn OutboundChannel>,
    dispatcher: Arc<ErrorDispatcher>,
    subscriptions: SubscriptionTable,
}

impl BrokerRelay {
    pub fn new(
        provider: Arc<BrokerLinkProvider>,
        config: RelayConfig,
        outbound: Arc<dyn OutboundChannel>,
        dispatcher: Arc<ErrorDispatcher>,
    ) -> Self {
        let passcode = SecretString::new(config.system_passcode.clone());
        Self {
            provider,
            config,
            passcode,
            outbound,
            dispatcher,
            subscriptions: SubscriptionTable::new(),
        }
    }

    /// Starts the relay task. It runs until every [`RelayHandle`] is dropped.
    pub fn spawn(self) -> (RelayHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let task = tokio::spawn(self.run(rx));
        (RelayHandle::new(tx), task)
    }

    async fn run(mut self, mut commands: mpsc::Receiver<RelayCommand>) {
        loop {
            let link = match self.provider.open_next().await {
                Ok(link) => link,
                Err(err) => {
                    tracing::warn!(error = %err, "Failed to open upstream broker link");
                    if self.wait_offline(&mut commands).await {
                        return;
                    }
                    continue;
                }
            };

            tracing::info!(
                node = %link.node,
                secure = link.stream.is_secure(),
                "Upstream broker link established"
            );

            match self.serve_link(link.stream, &mut commands).await {
                LinkOutcome::Shutdown => {
                    tracing::info!("Broker relay shutting down");
                    return;
                }
                LinkOutcome::Lost(reason) => {
                    tracing::warn!(node = %link.node, %reason, "Upstream broker link lost");
                    let failure =
                        RelayFailure::other("Connection to broker lost").with_cause(reason);
                    if let Err(err) = self.dispatcher.send_error_to_channel(None, &failure).await {
                        tracing::warn!(error = %err, "Failed to notify sessions of link loss");
                    }
                    if self.wait_offline(&mut commands).await {
                        return;
                    }
                }
            }
        }
    }

    /// Waits out the reconnect delay while answering commands.
    /// Returns `true` if the relay should stop.
    async fn wait_offline(&mut self, commands: &mut mpsc::Receiver<RelayCommand>) -> bool {
        let delay = tokio::time::sleep(self.config.reconnect_delay());
        tokio::pin!(delay);

        loop {
            tokio::select! {
                _ = &mut delay => return false,
                command = commands.recv() => match command {
                    None => return true,
                    Some(command) => self.handle_offline(command).await,
                },
            }
        }
    }

    async fn handle_offline(&mut self, command: RelayCommand) {
        match command {
            RelayCommand::Frame(frame) => {
                self.subscriptions.track(&frame);
                // Subscriptions are applied on reconnect; only a requested receipt needs an answer.
                let is_subscription = matches!(
                    frame.command,
                    StompCommand::Subscribe | StompCommand::Unsubscribe
                );
                if is_subscription && frame.receipt().is_none() {
                    return;
                }
                let failure = RelayFailure::other("Broker relay is not connected");
                self.report(&frame, &failure).await;
            }
            RelayCommand::SessionClosed(session_id) => {
                self.subscriptions.remove_session(&session_id);
            }
        }
    }

    async fn serve_link<S>(
        &mut self,
        stream: S,
        commands: &mut mpsc::Receiver<RelayCommand>,
    ) -> LinkOutcome
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (mut reader, mut writer) = tokio::io::split(stream);

        if let Err(err) = write_frame(&mut writer, &self.connect_frame()).await {
            return LinkOutcome::Lost(err.to_string());
        }
        for frame in self.subscriptions.replay() {
            if let Err(err) = write_frame(&mut writer, &correlation::to_upstream(frame)).await {
                return LinkOutcome::Lost(err.to_string());
            }
        }

        let heartbeat_enabled = self.config.heartbeat_send_ms > 0;
        let period = Duration::from_millis(self.config.heartbeat_send_ms.max(1));
        let mut heartbeat = interval_at(Instant::now() + period, period);

        let mut decoder = StompDecoder::with_max_frame_size(self.config.max_frame_size);
        let mut buf = vec![0u8; READ_BUFFER_SIZE];

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    None => {
                        let disconnect = StompFrame::new(StompCommand::Disconnect);
                        let _ = write_frame(&mut writer, &disconnect).await;
                        return LinkOutcome::Shutdown;
                    }
                    Some(RelayCommand::Frame(frame)) => {
                        self.subscriptions.track(&frame);
                        let upstream = correlation::to_upstream(frame.clone());
                        if let Err(err) = write_frame(&mut writer, &upstream).await {
                            let failure = RelayFailure::other("Failed to forward frame to broker")
                                .with_cause(err.to_string());
                            self.report(&frame, &failure).await;
                            return LinkOutcome::Lost(err.to_string());
                        }
                    }
                    Some(RelayCommand::SessionClosed(session_id)) => {
                        for frame in self.subscriptions.remove_session(&session_id) {
                            let upstream = correlation::to_upstream(frame);
                            if let Err(err) = write_frame(&mut writer, &upstream).await {
                                return LinkOutcome::Lost(err.to_string());
                            }
                        }
                    }
                },
                read = reader.read(&mut buf) => match read {
                    Ok(0) => return LinkOutcome::Lost("closed by broker".to_string()),
                    Ok(n) => {
                        decoder.extend(&buf[..n]);
                        loop {
                            match decoder.next_frame() {
                                Ok(Some(frame)) => self.route(frame).await,
                                Ok(None) => break,
                                Err(FrameError::TooLarge { max }) => {
                                    tracing::warn!(max_frame_size = max, "Dropping oversized broker frame");
                                    decoder.skip_frame();
                                }
                                Err(err) => {
                                    return LinkOutcome::Lost(format!("undecodable broker frame: {err}"));
                                }
                            }
                        }
                    }
                    Err(err) => return LinkOutcome::Lost(err.to_string()),
                },
                _ = heartbeat.tick(), if heartbeat_enabled => {
                    if let Err(err) = writer.write_all(b"\n").await {
                        return LinkOutcome::Lost(err.to_string());
                    }
                }
            }
        }
    }

    /// CONNECT frame carrying the relay's system credentials.
    fn connect_frame(&self) -> StompFrame {
        StompFrame::new(StompCommand::Connect)
            .with_header(headers::ACCEPT_VERSION, "1.2")
            .with_header(headers::HOST, self.config.virtual_host.clone())
            .with_header(headers::LOGIN, self.config.system_login.clone())
            .with_header(headers::PASSCODE, self.passcode.expose_secret().clone())
            .with_header(headers::HEART_BEAT, self.config.heartbeat_header())
    }

    /// Delivers a broker frame to the session it belongs to.
    async fn route(&self, mut frame: StompFrame) {
        let session = correlation::from_upstream(&mut frame);

        match frame.command {
            StompCommand::Connected => {
                tracing::info!(
                    version = ?frame.header(headers::VERSION),
                    heart_beat = ?frame.header(headers::HEART_BEAT),
                    "Broker accepted relay connection"
                );
            }
            StompCommand::Error => {
                tracing::warn!(
                    session_id = ?session,
                    message = ?frame.message(),
                    "Broker sent ERROR frame"
                );
                let frame = match self.dispatcher.handle_error_message_to_client(frame) {
                    Ok(frame) => frame,
                    Err(err) => {
                        tracing::error!(error = %err, "Failed to wrap broker ERROR frame");
                        return;
                    }
                };
                if frame.session_id.is_some() {
                    self.deliver(frame).await;
                } else if self.outbound.broadcast(frame).await == 0 {
                    tracing::debug!("No live session to receive broker ERROR frame");
                }
            }
            _ if session.is_some() => self.deliver(frame).await,
            _ => {
                tracing::debug!(command = %frame.command, "Dropping uncorrelated broker frame");
            }
        }
    }

    async fn deliver(&self, frame: StompFrame) {
        let session_id = frame.session_id.clone();
        if let Err(err) = self.outbound.send(frame).await {
            tracing::warn!(session_id = ?session_id, error = %err, "Failed to deliver broker frame");
        }
    }

    /// Out-of-band failure report for the session that sent `frame`.
    async fn report(&self, frame: &StompFrame, failure: &RelayFailure) {
        let context = ClientContext::from_frame(frame);
        if let Err(err) = self
            .dispatcher
            .send_error_to_channel(Some(&context), failure)
            .await
        {
            tracing::warn!(
                session_id = ?context.session_id,
                error = %err,
                "Failed to report relay failure"
            );
        }
    }
}

async fn write_frame<W>(writer: &mut W, frame: &StompFrame) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode(frame)).await?;
    writer.flush().await
}
