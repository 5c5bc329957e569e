//! Event dispatcher and membership tracker.
//!
//! The [`Engine`] is the sans-IO heart of the crate: it owns the
//! [`Session`] and the [`Registrar`], consumes decoded [`SessionEvent`]s
//! (or raw lines), and produces [`Step`]s - messages to send and notices
//! for the application. A driver (see [`crate::client`]) performs the
//! actual I/O; tests drive the engine directly with raw lines.
//!
//! Steps preserve decode order: notices are emitted in the order the
//! underlying protocol events arrived.

use tracing::debug;

use crate::command::Command;
use crate::event::{ChannelListEntry, SessionEvent};
use crate::nick::NickExt;
use crate::registration::{Registrar, RegistrationState};
use crate::session::{Session, SessionConfig};

/// Role-prefix decoration on NAMES nick tokens (operator, voice, ...),
/// plus any stray framing colon.
const ROLE_PREFIXES: &[char] = &['@', '+', '%', '&', '~', ':'];

/// A notification delivered to the application.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SessionNotice {
    /// A PRIVMSG arrived for a channel or for us.
    Message {
        /// Sender nickname.
        nick: String,
        /// Channel or nickname the message was addressed to.
        target: String,
        /// Message body.
        text: String,
    },
    /// A channel's member set changed.
    MembershipChanged {
        /// The channel whose membership changed.
        channel: String,
        /// The full member set after the change.
        members: Vec<String>,
    },
    /// Nickname status: confirmation, rename, or terminal failure.
    NickStatus {
        /// The confirmed or new nickname; `None` on terminal failure.
        nick: Option<String>,
        /// Whether the server has confirmed our nickname.
        confirmed: bool,
        /// Human-readable status detail.
        detail: String,
    },
    /// A channel's initial state is now fully known.
    JoinComplete {
        /// The channel whose entry completed.
        channel: String,
        /// Whether entry succeeded.
        success: bool,
    },
    /// One channel directory entry, streamed as it arrives.
    ChannelListEntry(ChannelListEntry),
    /// The channel directory is complete.
    ChannelListEnd {
        /// All entries aggregated since the LIST request.
        entries: Vec<ChannelListEntry>,
    },
}

/// One unit of work the engine asks its driver to perform.
#[derive(Clone, PartialEq, Debug)]
pub enum Step {
    /// Send this command to the server.
    Send(Command),
    /// Deliver this notice to the application.
    Notify(SessionNotice),
}

/// The session engine: one per connection attempt.
#[derive(Clone, Debug)]
pub struct Engine {
    session: Session,
    registrar: Registrar,
}

impl Engine {
    /// Create an engine for the given identity.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            session: Session::new(config.nickname),
            registrar: Registrar::new(config.username, config.realname),
        }
    }

    /// Read-only view of the session state.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current registration state.
    pub fn registration_state(&self) -> RegistrationState {
        self.registrar.state()
    }

    /// Begin the session: emits the registration handshake.
    pub fn start(&mut self) -> Vec<Step> {
        self.registrar.start(&self.session)
    }

    /// Process one raw protocol line.
    ///
    /// Undecodable lines and events outside the engine's closed set are
    /// dropped with a diagnostic; neither is ever fatal.
    pub fn handle_line(&mut self, line: &str) -> Vec<Step> {
        let msg = match line.parse::<crate::message::Message>() {
            Ok(msg) => msg,
            Err(error) => {
                debug!(%error, "dropping undecodable line");
                return Vec::new();
            }
        };

        match SessionEvent::decode(&msg) {
            Some(event) => self.handle(event),
            None => {
                debug!(command = %msg.command, "ignoring protocol noise");
                Vec::new()
            }
        }
    }

    /// Process one decoded event.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Step> {
        match event {
            SessionEvent::Welcome { nick } => self.registrar.on_welcome(&mut self.session, &nick),
            SessionEvent::NickInUse => {
                // After registration a 433 is the server rejecting a nick
                // change request; report it rather than re-entering
                // collision retry.
                if self.registrar.state() == RegistrationState::Confirmed {
                    vec![Step::Notify(SessionNotice::NickStatus {
                        nick: None,
                        confirmed: true,
                        detail: "nickname in use".to_string(),
                    })]
                } else {
                    self.registrar.on_nick_in_use(&mut self.session)
                }
            }
            SessionEvent::NamesReply { channel, nicks } => {
                let cleaned = nicks
                    .into_iter()
                    .map(|n| n.trim_start_matches(ROLE_PREFIXES).to_string())
                    .filter(|n| !n.is_empty());
                self.session.record_names(&channel, cleaned);
                Vec::new()
            }
            SessionEvent::EndOfNames { channel } => self.on_end_of_names(&channel),
            SessionEvent::Join { nick, channel } => self.on_join(&nick, &channel),
            SessionEvent::Part { nick, channel } => self.on_part(&nick, &channel),
            SessionEvent::Quit { nick } => self
                .session
                .record_quit(&nick)
                .into_iter()
                .map(|channel| self.membership_changed(channel))
                .collect(),
            SessionEvent::NickChange { old, new } => self.on_nick_change(&old, &new),
            SessionEvent::Privmsg { nick, target, text } => {
                vec![Step::Notify(SessionNotice::Message { nick, target, text })]
            }
            SessionEvent::ListEntry(entry) => {
                self.session.list_push(entry.clone());
                vec![Step::Notify(SessionNotice::ChannelListEntry(entry))]
            }
            SessionEvent::ListEnd => {
                vec![Step::Notify(SessionNotice::ChannelListEnd {
                    entries: self.session.list_take(),
                })]
            }
            SessionEvent::TryAgain { command } => {
                debug!(%command, "server asked us to retry later");
                Vec::new()
            }
            // Answered inline so keep-alive is never queued behind
            // application work.
            SessionEvent::Ping { token } => vec![Step::Send(Command::Pong(token))],
        }
    }

    fn on_end_of_names(&mut self, channel: &str) -> Vec<Step> {
        // End-of-names for a channel we never tracked is unsolicited
        // chatter; drop it.
        if self.session.finish_names(channel).is_none() {
            return Vec::new();
        }
        vec![
            self.membership_changed(channel.to_string()),
            Step::Notify(SessionNotice::JoinComplete {
                channel: channel.to_string(),
                success: true,
            }),
        ]
    }

    fn on_join(&mut self, nick: &str, channel: &str) -> Vec<Step> {
        let mut steps = Vec::new();
        if self.session.record_join(channel, nick) {
            steps.push(self.membership_changed(channel.to_string()));
        }
        // Our own JOIN echo confirms channel entry without waiting for the
        // NAMES burst; both signals may fire for a self-join.
        if nick == self.session.current_nick() {
            steps.push(Step::Notify(SessionNotice::JoinComplete {
                channel: channel.to_string(),
                success: true,
            }));
        }
        steps
    }

    fn on_part(&mut self, nick: &str, channel: &str) -> Vec<Step> {
        let mut steps = Vec::new();
        if self.session.record_part(channel, nick) {
            steps.push(self.membership_changed(channel.to_string()));
        }
        if nick == self.session.current_nick() {
            self.session.remove_channel(channel);
        }
        steps
    }

    fn on_nick_change(&mut self, old: &str, new: &str) -> Vec<Step> {
        let mut steps = Vec::new();

        // Our own rename: the server may know us by the current candidate
        // or still by the originally desired name.
        if old == self.session.current_nick() || old == self.session.desired_nick() {
            self.session.adopt_nick(new);
            steps.push(Step::Notify(SessionNotice::NickStatus {
                nick: Some(new.to_string()),
                confirmed: self.session.nick_confirmed(),
                detail: format!("nickname changed to {}", new),
            }));
        }

        for channel in self.session.record_rename(old, new) {
            steps.push(self.membership_changed(channel));
        }
        steps
    }

    fn membership_changed(&self, channel: String) -> Step {
        let members = self
            .session
            .channel_members(&channel)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default();
        Step::Notify(SessionNotice::MembershipChanged { channel, members })
    }

    // --- Commands from the application layer ---

    /// Send a join request. Creates the channel entry immediately so the
    /// subsequent server echo and NAMES burst are tracked.
    pub fn join_channel(&mut self, channel: &str) -> Vec<Step> {
        self.session.track_channel(channel);
        vec![Step::Send(Command::Join(channel.to_string()))]
    }

    /// Leave a channel.
    pub fn part_channel(&mut self, channel: &str) -> Vec<Step> {
        vec![Step::Send(Command::Part(channel.to_string()))]
    }

    /// Send a message to a channel or nickname.
    pub fn send_message(&mut self, target: &str, text: &str) -> Vec<Step> {
        vec![Step::Send(Command::Privmsg(
            target.to_string(),
            text.to_string(),
        ))]
    }

    /// Request a nickname change. Grammar violations are reported as a
    /// status notice without touching the wire; the server's verdict on a
    /// valid request arrives later through the event stream.
    pub fn change_nick(&mut self, new_nick: &str) -> Vec<Step> {
        if !new_nick.is_valid_nick() {
            return vec![Step::Notify(SessionNotice::NickStatus {
                nick: None,
                confirmed: self.session.nick_confirmed(),
                detail: format!("erroneous nickname: {}", new_nick),
            })];
        }
        vec![Step::Send(Command::Nick(new_nick.to_string()))]
    }

    /// Request the server's channel directory, discarding any stale
    /// partially-aggregated result.
    pub fn list_channels(&mut self, pattern: Option<&str>) -> Vec<Step> {
        self.session.list_reset();
        vec![Step::Send(Command::List(pattern.map(str::to_string)))]
    }

    /// Announce session end. The driver closes the transport regardless of
    /// whether this reaches the server.
    pub fn quit(&mut self) -> Vec<Step> {
        vec![Step::Send(Command::Quit(Some("Goodbye!".to_string())))]
    }
}
