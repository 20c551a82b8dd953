//! TCP front end: one task and one `Session` per accepted connection.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use shared::models::ClientMessage;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use super::session::{Session, SessionConfig};
use crate::config::EngineSettings;
use crate::error::{EngineError, Result};
use crate::ml::{ModelStore, Trainer};
use crate::net::{Connection, FrameCodec};

pub struct Server<T, S> {
    listener: TcpListener,
    codec: FrameCodec,
    session_config: SessionConfig,
    trainer: Arc<T>,
    store: Arc<S>,
}

impl<T, S> Server<T, S>
where
    T: Trainer,
    S: ModelStore<T::Model>,
{
    pub async fn bind(settings: &EngineSettings, trainer: Arc<T>, store: Arc<S>) -> Result<Self> {
        let addr = settings.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| EngineError::ConfigError(format!("Failed to bind {}: {}", addr, e)))?;
        let codec = FrameCodec::new(settings.tcp.header_format, settings.tcp.max_frame_len);
        info!(
            addr = %listener.local_addr()?,
            header_format = %codec.header(),
            max_payload_len = codec.max_payload_len(),
            lookback_period = settings.pipeline.lookback_period,
            swing_strength = settings.pipeline.swing_strength,
            "TCP server started"
        );
        Ok(Server {
            listener,
            codec,
            session_config: SessionConfig::from_settings(settings),
            trainer,
            store,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections forever.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Accepts connections until `shutdown` resolves. Connections already being
    /// served keep running on their own tasks.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, no longer accepting connections");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        if let Err(e) = stream.set_nodelay(true) {
                            warn!(%peer, "Failed to set TCP_NODELAY: {}", e);
                        }
                        self.spawn_session(stream, peer);
                    }
                    Err(e) => {
                        // Accept failures (e.g. too many open files) must not stop the listener.
                        error!(error_detail = %e, "Failed to accept connection");
                    }
                },
            }
        }
    }

    fn spawn_session<IO>(&self, stream: IO, peer: SocketAddr)
    where
        IO: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let codec = self.codec;
        let config = self.session_config.clone();
        let trainer = self.trainer.clone();
        let store = self.store.clone();
        tokio::spawn(async move {
            info!(%peer, "Client connected");
            match serve_connection(stream, Some(peer), codec, &config, trainer, store).await {
                Ok(()) => info!(%peer, "Client disconnected"),
                Err(e) => warn!(%peer, error_detail = %e, "Connection closed after error; session discarded"),
            }
        });
    }
}

/// Runs one session over `stream` until the peer disconnects or an error ends it.
///
/// Returns `Ok(())` on a clean disconnect between frames. Framing errors,
/// undecodable messages and fatal session errors are returned as `Err`; in every
/// case the session state is dropped with the connection.
pub async fn serve_connection<IO, T, S>(
    stream: IO,
    peer: Option<SocketAddr>,
    codec: FrameCodec,
    config: &SessionConfig,
    trainer: Arc<T>,
    store: Arc<S>,
) -> Result<()>
where
    IO: AsyncRead + AsyncWrite + Unpin,
    T: Trainer,
    S: ModelStore<T::Model>,
{
    let mut conn = Connection::new(stream, codec, peer);
    let session = Session::new(config, trainer, store);

    let result = drive_session(&mut conn, session).await;
    debug!(
        peer = ?conn.peer_addr(),
        frames_received = conn.frames_received(),
        frames_sent = conn.frames_sent(),
        "Connection finished"
    );
    result
}

async fn drive_session<IO, T, S>(conn: &mut Connection<IO>, mut session: Session<T, S>) -> Result<()>
where
    IO: AsyncRead + AsyncWrite + Unpin,
    T: Trainer,
    S: ModelStore<T::Model>,
{
    loop {
        let message: ClientMessage = match conn.recv().await {
            Ok(message) => message,
            Err(EngineError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        };
        debug!(peer = ?conn.peer_addr(), ?message, "Dispatching message");

        // Training and model loading can take a long time; keep them off the
        // async workers so other connections are not stalled.
        let (returned, outcome) = tokio::task::spawn_blocking(move || {
            let outcome = session.handle(message);
            (session, outcome)
        })
        .await
        .map_err(|e| EngineError::TaskError(e.to_string()))?;
        session = returned;

        // A peer that left while the work ran surfaces here as a write error,
        // which ends this connection only.
        if let Some(reply) = outcome? {
            conn.send(&reply).await?;
        }
    }
}
