//! Registration state machine.
//!
//! Sans-IO: drives nickname negotiation from initial connect through
//! collision retries to the server's welcome, consuming events and
//! producing [`Step`]s for the caller to act on. Nothing here performs I/O,
//! which keeps every transition unit-testable.

use tracing::{debug, info, warn};

use crate::command::Command;
use crate::engine::{SessionNotice, Step};
use crate::nick::collision_candidate;
use crate::session::{Session, MAX_NICK_ATTEMPTS};

/// Where the registration handshake currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RegistrationState {
    /// Not yet started; no handshake sent.
    #[default]
    Connecting,
    /// NICK/USER sent, waiting for 001 (or a collision).
    AwaitingWelcome,
    /// 001 received; the nickname is confirmed.
    Confirmed,
    /// Retry bound exceeded; terminal.
    Failed,
}

/// Drives the identity handshake for one session.
#[derive(Clone, Debug)]
pub struct Registrar {
    state: RegistrationState,
    username: String,
    realname: String,
    /// Last collision candidate sent, so a fresh draw never repeats it.
    last_candidate: Option<String>,
}

impl Registrar {
    /// Create a registrar for the given identity.
    pub fn new(username: impl Into<String>, realname: impl Into<String>) -> Self {
        Self {
            state: RegistrationState::Connecting,
            username: username.into(),
            realname: realname.into(),
            last_candidate: None,
        }
    }

    /// Current handshake state.
    pub fn state(&self) -> RegistrationState {
        self.state
    }

    /// Begin registration: send the NICK + USER handshake.
    pub fn start(&mut self, session: &Session) -> Vec<Step> {
        self.state = RegistrationState::AwaitingWelcome;
        debug!(nick = %session.desired_nick(), "starting registration");
        vec![
            Step::Send(Command::Nick(session.desired_nick().to_string())),
            Step::Send(Command::User(
                self.username.clone(),
                self.realname.clone(),
            )),
        ]
    }

    /// Handle a "nickname in use" reply.
    ///
    /// Inside the retry bound, synthesizes a fresh randomized candidate and
    /// sends a NICK change; past it, transitions to [`RegistrationState::Failed`]
    /// and emits exactly one terminal failure notice.
    pub fn on_nick_in_use(&mut self, session: &mut Session) -> Vec<Step> {
        if self.state != RegistrationState::AwaitingWelcome {
            return Vec::new();
        }

        let attempt = session.bump_nick_attempt();
        if attempt > MAX_NICK_ATTEMPTS {
            warn!(
                desired = %session.desired_nick(),
                attempts = attempt - 1,
                "could not find an available nickname"
            );
            self.state = RegistrationState::Failed;
            return vec![Step::Notify(SessionNotice::NickStatus {
                nick: None,
                confirmed: false,
                detail: "could not find an available nickname".to_string(),
            })];
        }

        let candidate = self.next_candidate(session.desired_nick());
        debug!(attempt, candidate = %candidate, "nickname in use, retrying");
        session.adopt_nick(&candidate);
        self.last_candidate = Some(candidate.clone());
        vec![Step::Send(Command::Nick(candidate))]
    }

    /// Handle the server's welcome.
    ///
    /// Adopts the acknowledged nickname (servers may mutate the candidate
    /// further) and reports whether it differs from the desired one.
    pub fn on_welcome(&mut self, session: &mut Session, nick: &str) -> Vec<Step> {
        if self.state != RegistrationState::AwaitingWelcome {
            return Vec::new();
        }

        self.state = RegistrationState::Confirmed;
        let changed = session.confirm_nick(nick);
        info!(nick = %session.current_nick(), changed, "registration confirmed");

        let detail = if changed {
            format!("nickname changed to {}", session.current_nick())
        } else {
            "connected".to_string()
        };
        vec![Step::Notify(SessionNotice::NickStatus {
            nick: Some(session.current_nick().to_string()),
            confirmed: true,
            detail,
        })]
    }

    /// Draw a candidate that differs from the previous one.
    fn next_candidate(&self, base: &str) -> String {
        loop {
            let candidate = collision_candidate(base);
            if self.last_candidate.as_deref() != Some(candidate.as_str()) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Registrar, Session) {
        (Registrar::new("cord", "Cord User"), Session::new("cord"))
    }

    fn sent_nicks(steps: &[Step]) -> Vec<String> {
        steps
            .iter()
            .filter_map(|s| match s {
                Step::Send(Command::Nick(n)) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_start_sends_nick_and_user() {
        let (mut registrar, session) = setup();
        let steps = registrar.start(&session);
        assert_eq!(registrar.state(), RegistrationState::AwaitingWelcome);
        assert_eq!(
            steps,
            vec![
                Step::Send(Command::Nick("cord".into())),
                Step::Send(Command::User("cord".into(), "Cord User".into())),
            ]
        );
    }

    #[test]
    fn test_collision_sends_fresh_candidate() {
        let (mut registrar, mut session) = setup();
        let _ = registrar.start(&session);

        let steps = registrar.on_nick_in_use(&mut session);
        let nicks = sent_nicks(&steps);
        assert_eq!(nicks.len(), 1);
        assert!(nicks[0].starts_with("cord"));
        assert_ne!(nicks[0], "cord");
        assert_eq!(session.current_nick(), nicks[0]);
        assert_eq!(registrar.state(), RegistrationState::AwaitingWelcome);
    }

    #[test]
    fn test_consecutive_candidates_differ() {
        let (mut registrar, mut session) = setup();
        let _ = registrar.start(&session);

        let mut previous: Option<String> = None;
        for _ in 0..30 {
            let steps = registrar.on_nick_in_use(&mut session);
            let nicks = sent_nicks(&steps);
            assert_eq!(nicks.len(), 1);
            if let Some(prev) = previous {
                assert_ne!(prev, nicks[0]);
            }
            previous = Some(nicks[0].clone());
        }
    }

    #[test]
    fn test_retry_bound_is_terminal() {
        let (mut registrar, mut session) = setup();
        let _ = registrar.start(&session);

        let mut failures = 0;
        let mut sends = 0;
        for _ in 0..=MAX_NICK_ATTEMPTS {
            for step in registrar.on_nick_in_use(&mut session) {
                match step {
                    Step::Send(Command::Nick(_)) => sends += 1,
                    Step::Notify(SessionNotice::NickStatus {
                        confirmed: false, ..
                    }) => failures += 1,
                    other => panic!("unexpected step: {:?}", other),
                }
            }
        }

        assert_eq!(sends, MAX_NICK_ATTEMPTS);
        assert_eq!(failures, 1);
        assert_eq!(registrar.state(), RegistrationState::Failed);

        // Past the terminal state nothing further happens.
        assert!(registrar.on_nick_in_use(&mut session).is_empty());
    }

    #[test]
    fn test_welcome_confirms_acknowledged_nick() {
        let (mut registrar, mut session) = setup();
        let _ = registrar.start(&session);
        let _ = registrar.on_nick_in_use(&mut session);

        // The server may settle on a nick other than our last candidate.
        let steps = registrar.on_welcome(&mut session, "cord4821");
        assert_eq!(registrar.state(), RegistrationState::Confirmed);
        assert_eq!(session.current_nick(), "cord4821");
        assert!(session.nick_confirmed());
        assert_eq!(
            steps,
            vec![Step::Notify(SessionNotice::NickStatus {
                nick: Some("cord4821".into()),
                confirmed: true,
                detail: "nickname changed to cord4821".into(),
            })]
        );
    }

    #[test]
    fn test_welcome_without_change() {
        let (mut registrar, mut session) = setup();
        let _ = registrar.start(&session);
        let steps = registrar.on_welcome(&mut session, "cord");
        assert_eq!(
            steps,
            vec![Step::Notify(SessionNotice::NickStatus {
                nick: Some("cord".into()),
                confirmed: true,
                detail: "connected".into(),
            })]
        );
    }

    #[test]
    fn test_welcome_ignored_after_failure() {
        let (mut registrar, mut session) = setup();
        let _ = registrar.start(&session);
        for _ in 0..=MAX_NICK_ATTEMPTS {
            let _ = registrar.on_nick_in_use(&mut session);
        }
        assert!(registrar.on_welcome(&mut session, "cord").is_empty());
    }
}
