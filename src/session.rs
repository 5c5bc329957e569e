//! Authoritative session state.
//!
//! One [`Session`] exists per connection attempt and is discarded on
//! disconnect; reconnection builds a fresh one with the attempt counter
//! reset. All mutation goes through intention-revealing methods so the
//! invariants (no stale NAMES leakage, atomic renames, bounded retry) are
//! enforced in one place rather than scattered across handler call sites.
//!
//! Nickname and channel comparison is exact byte equality. IRC casemapping
//! (`rfc1459` folding of `[]\~` and case) is a known simplification here;
//! a folding layer would slot into this type's key handling.

use std::collections::{BTreeSet, HashMap};

use crate::event::ChannelListEntry;

/// Collision retries allowed before registration fails terminally.
pub const MAX_NICK_ATTEMPTS: u32 = 99;

/// Identity configuration for one session.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionConfig {
    /// Desired nickname; the base for collision-retry candidates.
    pub nickname: String,
    /// Username (ident).
    pub username: String,
    /// Real name / GECOS.
    pub realname: String,
}

/// Per-channel membership state.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelState {
    members: BTreeSet<String>,
    names_in_progress: bool,
}

impl ChannelState {
    /// The channel's member set, complete once NAMES has finished.
    pub fn members(&self) -> &BTreeSet<String> {
        &self.members
    }

    /// Whether a NAMES burst for this channel is still being accumulated.
    pub fn names_in_progress(&self) -> bool {
        self.names_in_progress
    }
}

/// The authoritative mutable model for one connection.
#[derive(Clone, Debug)]
pub struct Session {
    desired_nick: String,
    current_nick: String,
    nick_confirmed: bool,
    nick_attempt: u32,
    channels: HashMap<String, ChannelState>,
    list_pending: Vec<ChannelListEntry>,
}

impl Session {
    /// Create a fresh session. `current_nick` starts as the desired nick.
    pub fn new(desired_nick: impl Into<String>) -> Self {
        let desired_nick = desired_nick.into();
        Self {
            current_nick: desired_nick.clone(),
            desired_nick,
            nick_confirmed: false,
            nick_attempt: 0,
            channels: HashMap::new(),
            list_pending: Vec::new(),
        }
    }

    /// The identity originally requested; immutable for the session's life.
    pub fn desired_nick(&self) -> &str {
        &self.desired_nick
    }

    /// Best-known nickname; authoritative once [`Self::nick_confirmed`].
    pub fn current_nick(&self) -> &str {
        &self.current_nick
    }

    /// Whether the server has acknowledged our nickname with a welcome.
    pub fn nick_confirmed(&self) -> bool {
        self.nick_confirmed
    }

    /// Collision retries used so far.
    pub fn nick_attempt(&self) -> u32 {
        self.nick_attempt
    }

    /// Member set of a channel, if tracked.
    pub fn channel_members(&self, channel: &str) -> Option<&BTreeSet<String>> {
        self.channels.get(channel).map(ChannelState::members)
    }

    /// State of a tracked channel.
    pub fn channel(&self, channel: &str) -> Option<&ChannelState> {
        self.channels.get(channel)
    }

    /// Whether the session tracks the given channel at all.
    pub fn tracks_channel(&self, channel: &str) -> bool {
        self.channels.contains_key(channel)
    }

    /// Record a collision retry. Returns the new attempt count.
    pub fn bump_nick_attempt(&mut self) -> u32 {
        self.nick_attempt += 1;
        self.nick_attempt
    }

    /// Replace the best-known nickname. Empty replacements are ignored so
    /// `current_nick` is never observable as empty.
    pub fn adopt_nick(&mut self, nick: &str) {
        if !nick.is_empty() {
            self.current_nick = nick.to_string();
        }
    }

    /// Mark the nickname confirmed by the server's welcome.
    ///
    /// Returns `true` if the confirmed name differs from the desired one.
    pub fn confirm_nick(&mut self, nick: &str) -> bool {
        self.adopt_nick(nick);
        self.nick_confirmed = true;
        self.current_nick != self.desired_nick
    }

    /// Ensure a channel entry exists (on first JOIN send).
    pub fn track_channel(&mut self, channel: &str) {
        self.channels.entry(channel.to_string()).or_default();
    }

    /// Record one NAMES line for a channel.
    ///
    /// The first line of a burst discards whatever member set a previous
    /// visit left behind, then appends; later lines of the same burst only
    /// append. Creates the channel entry if absent.
    pub fn record_names<I>(&mut self, channel: &str, nicks: I)
    where
        I: IntoIterator<Item = String>,
    {
        let state = self.channels.entry(channel.to_string()).or_default();
        if !state.names_in_progress {
            state.members.clear();
            state.names_in_progress = true;
        }
        state.members.extend(nicks);
    }

    /// Close a NAMES burst. Returns the now-complete member set, or `None`
    /// if the channel is not tracked.
    pub fn finish_names(&mut self, channel: &str) -> Option<&BTreeSet<String>> {
        let state = self.channels.get_mut(channel)?;
        state.names_in_progress = false;
        Some(&state.members)
    }

    /// Record that `nick` joined `channel`.
    ///
    /// Creates the entry when we are the joiner. Returns `true` if the
    /// member set changed; `false` for duplicates and for other nicks in
    /// channels we do not track.
    pub fn record_join(&mut self, channel: &str, nick: &str) -> bool {
        let is_self = nick == self.current_nick;
        match self.channels.get_mut(channel) {
            Some(state) => state.members.insert(nick.to_string()),
            None if is_self => {
                let state = self.channels.entry(channel.to_string()).or_default();
                state.members.insert(nick.to_string())
            }
            None => false,
        }
    }

    /// Record that `nick` left `channel`. Returns `true` if it was tracked
    /// there; unknown channels and untracked nicks are a no-op.
    pub fn record_part(&mut self, channel: &str, nick: &str) -> bool {
        self.channels
            .get_mut(channel)
            .map(|state| state.members.remove(nick))
            .unwrap_or(false)
    }

    /// Record that `nick` disconnected. Returns the channels it was removed
    /// from, in no particular order.
    pub fn record_quit(&mut self, nick: &str) -> Vec<String> {
        let mut affected = Vec::new();
        for (channel, state) in &mut self.channels {
            if state.members.remove(nick) {
                affected.push(channel.clone());
            }
        }
        affected
    }

    /// Record a rename across every channel containing `old`. The swap is
    /// per-channel atomic: no channel is observable with both names absent.
    /// Returns the affected channels.
    pub fn record_rename(&mut self, old: &str, new: &str) -> Vec<String> {
        let mut affected = Vec::new();
        for (channel, state) in &mut self.channels {
            if state.members.remove(old) {
                state.members.insert(new.to_string());
                affected.push(channel.clone());
            }
        }
        affected
    }

    /// Drop a channel entry entirely (on self-PART).
    pub fn remove_channel(&mut self, channel: &str) {
        self.channels.remove(channel);
    }

    /// Append one channel directory entry to the in-flight LIST.
    pub fn list_push(&mut self, entry: ChannelListEntry) {
        self.list_pending.push(entry);
    }

    /// Take the aggregated channel directory, clearing the accumulator.
    pub fn list_take(&mut self) -> Vec<ChannelListEntry> {
        std::mem::take(&mut self.list_pending)
    }

    /// Discard any partially aggregated LIST (on a fresh LIST request).
    pub fn list_reset(&mut self) {
        self.list_pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(session: &Session, channel: &str) -> Vec<String> {
        session
            .channel_members(channel)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_new_session_nick_state() {
        let session = Session::new("cord");
        assert_eq!(session.desired_nick(), "cord");
        assert_eq!(session.current_nick(), "cord");
        assert!(!session.nick_confirmed());
        assert_eq!(session.nick_attempt(), 0);
    }

    #[test]
    fn test_confirm_nick_reports_change() {
        let mut session = Session::new("cord");
        assert!(!session.confirm_nick("cord"));
        let mut session = Session::new("cord");
        assert!(session.confirm_nick("cord4821"));
        assert_eq!(session.current_nick(), "cord4821");
        assert!(session.nick_confirmed());
    }

    #[test]
    fn test_adopt_nick_rejects_empty() {
        let mut session = Session::new("cord");
        session.adopt_nick("");
        assert_eq!(session.current_nick(), "cord");
    }

    #[test]
    fn test_names_first_line_discards_stale_members() {
        let mut session = Session::new("cord");
        session.record_names("#general", vec!["ghost".to_string()]);
        session.finish_names("#general");

        // A fresh burst must not union with the previous visit.
        session.record_names("#general", vec!["alice".to_string()]);
        session.record_names("#general", vec!["bob".to_string()]);
        session.finish_names("#general");
        assert_eq!(members(&session, "#general"), vec!["alice", "bob"]);
    }

    #[test]
    fn test_names_burst_appends_across_lines() {
        let mut session = Session::new("cord");
        session.record_names("#big", vec!["a".to_string(), "b".to_string()]);
        assert!(session.channel("#big").unwrap().names_in_progress());
        session.record_names("#big", vec!["c".to_string()]);
        let complete = session.finish_names("#big").unwrap();
        assert_eq!(complete.len(), 3);
        assert!(!session.channel("#big").unwrap().names_in_progress());
    }

    #[test]
    fn test_record_join_deduplicates() {
        let mut session = Session::new("cord");
        session.track_channel("#general");
        assert!(session.record_join("#general", "alice"));
        assert!(!session.record_join("#general", "alice"));
        assert_eq!(members(&session, "#general"), vec!["alice"]);
    }

    #[test]
    fn test_record_join_unknown_channel_by_other_is_dropped() {
        let mut session = Session::new("cord");
        assert!(!session.record_join("#elsewhere", "alice"));
        assert!(!session.tracks_channel("#elsewhere"));
    }

    #[test]
    fn test_record_join_unknown_channel_by_self_creates_entry() {
        let mut session = Session::new("cord");
        assert!(session.record_join("#new", "cord"));
        assert_eq!(members(&session, "#new"), vec!["cord"]);
    }

    #[test]
    fn test_record_part_is_noop_for_untracked() {
        let mut session = Session::new("cord");
        assert!(!session.record_part("#nowhere", "alice"));
        session.track_channel("#general");
        assert!(!session.record_part("#general", "alice"));
    }

    #[test]
    fn test_record_quit_touches_only_member_channels() {
        let mut session = Session::new("cord");
        session.record_names("#a", vec!["alice".to_string(), "bob".to_string()]);
        session.record_names("#b", vec!["alice".to_string()]);
        session.record_names("#c", vec!["carol".to_string()]);

        let mut affected = session.record_quit("alice");
        affected.sort();
        assert_eq!(affected, vec!["#a", "#b"]);
        assert_eq!(members(&session, "#a"), vec!["bob"]);
        assert_eq!(members(&session, "#b"), Vec::<String>::new());
        assert_eq!(members(&session, "#c"), vec!["carol"]);
    }

    #[test]
    fn test_record_rename_swaps_in_place() {
        let mut session = Session::new("cord");
        session.record_names("#a", vec!["alice".to_string(), "bob".to_string()]);
        session.record_names("#b", vec!["carol".to_string()]);

        let affected = session.record_rename("alice", "alicia");
        assert_eq!(affected, vec!["#a"]);
        assert_eq!(members(&session, "#a"), vec!["alicia", "bob"]);
    }

    #[test]
    fn test_list_aggregation() {
        let mut session = Session::new("cord");
        session.list_push(ChannelListEntry {
            name: "#rust".into(),
            users: 42,
            topic: "Rust talk".into(),
        });
        let entries = session.list_take();
        assert_eq!(entries.len(), 1);
        assert!(session.list_take().is_empty());
    }
}
