//! Tokio connection driver.
//!
//! One reactor task owns the [`Engine`] and the framed TCP stream. Exactly
//! one decoded event is processed at a time; application commands arrive
//! through an mpsc queue and notices leave through an unbounded mpsc, so a
//! slow consumer can never stall protocol processing (PING replies in
//! particular are written before anything else is dequeued).

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::codec::LineCodec;
use crate::engine::{Engine, SessionNotice, Step};
use crate::error::{ProtocolError, SessionError};
use crate::session::SessionConfig;

/// Commands accepted from the application layer.
#[derive(Debug)]
enum ClientCommand {
    Join(String),
    Part(String),
    Privmsg(String, String),
    Nick(String),
    List(Option<String>),
    Disconnect,
}

/// Handle to a running session.
///
/// All methods are fire-and-forget: they enqueue a command for the reactor
/// and return immediately. Correlated server replies arrive later through
/// the notice stream. Once the connection is down every method is a no-op,
/// which makes [`Client::disconnect`] idempotent and safe from any state.
#[derive(Clone, Debug)]
pub struct Client {
    cmd_tx: mpsc::UnboundedSender<ClientCommand>,
}

impl Client {
    /// Connect to a server and start the session.
    ///
    /// Resolves once the TCP stream is up and the reactor task is running;
    /// registration proceeds asynchronously and completes with a
    /// [`SessionNotice::NickStatus`] on the returned notice stream.
    pub async fn connect(
        addr: &str,
        config: SessionConfig,
    ) -> Result<(Client, mpsc::UnboundedReceiver<SessionNotice>), SessionError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(SessionError::Connect)?;
        info!(%addr, nick = %config.nickname, "connected");

        let framed = Framed::new(stream, LineCodec::new());
        let engine = Engine::new(config);
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        tokio::spawn(run(framed, engine, cmd_rx, notice_tx));

        Ok((Client { cmd_tx }, notice_rx))
    }

    /// Send a join request; does not wait for confirmation.
    pub fn join_channel(&self, channel: impl Into<String>) {
        let _ = self.cmd_tx.send(ClientCommand::Join(channel.into()));
    }

    /// Leave a channel.
    pub fn part_channel(&self, channel: impl Into<String>) {
        let _ = self.cmd_tx.send(ClientCommand::Part(channel.into()));
    }

    /// Send a message to a channel or nickname.
    pub fn send_message(&self, target: impl Into<String>, text: impl Into<String>) {
        let _ = self
            .cmd_tx
            .send(ClientCommand::Privmsg(target.into(), text.into()));
    }

    /// Request a nickname change; the outcome arrives as a
    /// [`SessionNotice::NickStatus`].
    pub fn change_nick(&self, new_nick: impl Into<String>) {
        let _ = self.cmd_tx.send(ClientCommand::Nick(new_nick.into()));
    }

    /// Request the server's channel directory, optionally filtered.
    pub fn list_channels(&self, pattern: Option<String>) {
        let _ = self.cmd_tx.send(ClientCommand::List(pattern));
    }

    /// Tear down the connection. Idempotent; a best-effort QUIT is sent but
    /// teardown completes whether or not it reaches the server.
    pub fn disconnect(&self) {
        let _ = self.cmd_tx.send(ClientCommand::Disconnect);
    }
}

/// The reactor: the only place session state is mutated.
async fn run(
    mut framed: Framed<TcpStream, LineCodec>,
    mut engine: Engine,
    mut cmd_rx: mpsc::UnboundedReceiver<ClientCommand>,
    notice_tx: mpsc::UnboundedSender<SessionNotice>,
) {
    let startup = engine.start();
    if apply(&mut framed, &notice_tx, startup).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            line = framed.next() => match line {
                Some(Ok(line)) => {
                    let steps = engine.handle_line(&line);
                    if apply(&mut framed, &notice_tx, steps).await.is_err() {
                        break;
                    }
                }
                Some(Err(ProtocolError::InvalidUtf8 { byte_pos })) => {
                    // The bad line was consumed; the stream stays usable.
                    debug!(byte_pos, "dropping non-UTF-8 line");
                }
                Some(Err(ProtocolError::LineTooLong { actual, limit })) => {
                    // The codec discards through the next newline, so the
                    // stream stays usable here too.
                    debug!(actual, limit, "dropping over-length line");
                }
                Some(Err(error)) => {
                    warn!(%error, "transport error, closing");
                    break;
                }
                None => {
                    info!("server closed the connection");
                    break;
                }
            },
            cmd = cmd_rx.recv() => {
                let steps = match cmd {
                    // All handles dropped counts as an explicit disconnect.
                    None | Some(ClientCommand::Disconnect) => {
                        let _ = apply(&mut framed, &notice_tx, engine.quit()).await;
                        info!("disconnecting");
                        break;
                    }
                    Some(ClientCommand::Join(channel)) => engine.join_channel(&channel),
                    Some(ClientCommand::Part(channel)) => engine.part_channel(&channel),
                    Some(ClientCommand::Privmsg(target, text)) => {
                        engine.send_message(&target, &text)
                    }
                    Some(ClientCommand::Nick(nick)) => engine.change_nick(&nick),
                    Some(ClientCommand::List(pattern)) => {
                        engine.list_channels(pattern.as_deref())
                    }
                };
                if apply(&mut framed, &notice_tx, steps).await.is_err() {
                    break;
                }
            }
        }
    }
    // Dropping the framed stream tears down the socket; the closed notice
    // channel tells the application the session is over.
}

/// Perform the engine's steps in order: writes go to the wire, notices to
/// the application. A notice send failure only means the application
/// dropped its receiver; that is not an error.
async fn apply(
    framed: &mut Framed<TcpStream, LineCodec>,
    notice_tx: &mpsc::UnboundedSender<SessionNotice>,
    steps: Vec<Step>,
) -> Result<(), ProtocolError> {
    for step in steps {
        match step {
            Step::Send(cmd) => {
                if let Err(error) = framed.send(cmd).await {
                    warn!(%error, "write failed, closing");
                    return Err(error);
                }
            }
            Step::Notify(notice) => {
                let _ = notice_tx.send(notice);
            }
        }
    }
    Ok(())
}
