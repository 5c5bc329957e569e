//! Decoded protocol events.
//!
//! [`SessionEvent`] is a closed sum type covering the finite set of server
//! events this engine consumes. Decoding a [`Message`] yields either one
//! variant or `None` for protocol noise the engine ignores; the dispatcher
//! then handles events with a single exhaustive `match`, so a newly added
//! variant fails to compile until every consumer handles it.

use crate::message::Message;
use crate::response::Response;

/// Tokens a NAMES reply uses to mark channel visibility; never a channel name.
const LIST_SENTINELS: [&str; 3] = ["=", "*", "@"];

/// One entry of the server's channel directory (RPL_LIST).
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelListEntry {
    /// Channel name.
    pub name: String,
    /// Reported member count.
    pub users: u32,
    /// Channel topic, empty if the server sent none.
    pub topic: String,
}

/// A server event the session engine consumes.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SessionEvent {
    /// 001 - registration complete; `nick` is the server-acknowledged name.
    Welcome {
        /// The nickname the server addressed the welcome to.
        nick: String,
    },
    /// 433 - the requested nickname is taken.
    NickInUse,
    /// 353 - one line of a channel's member list. Nick tokens still carry
    /// their role prefix decoration; the membership tracker strips it.
    NamesReply {
        /// Target channel.
        channel: String,
        /// Raw nickname tokens from this line.
        nicks: Vec<String>,
    },
    /// 366 - a channel's member list is complete.
    EndOfNames {
        /// Target channel.
        channel: String,
    },
    /// JOIN - `nick` entered `channel`.
    Join {
        /// The joining nickname.
        nick: String,
        /// The channel joined.
        channel: String,
    },
    /// PART - `nick` left `channel`.
    Part {
        /// The departing nickname.
        nick: String,
        /// The channel left.
        channel: String,
    },
    /// QUIT - `nick` disconnected from the network.
    Quit {
        /// The departing nickname.
        nick: String,
    },
    /// NICK - `old` renamed itself to `new`.
    NickChange {
        /// Previous nickname.
        old: String,
        /// New nickname.
        new: String,
    },
    /// PRIVMSG - a message to a channel or to us.
    Privmsg {
        /// Sender nickname.
        nick: String,
        /// Channel or nickname the message was addressed to.
        target: String,
        /// Message body.
        text: String,
    },
    /// 322 - one channel directory entry.
    ListEntry(ChannelListEntry),
    /// 323 - the channel directory is complete.
    ListEnd,
    /// 263 - the server asked us to retry a command later.
    TryAgain {
        /// The command the server deferred, as reported.
        command: String,
    },
    /// PING - keep-alive probe; must be answered promptly.
    Ping {
        /// Token to echo back in the PONG.
        token: String,
    },
}

impl SessionEvent {
    /// Decode a message into a session event.
    ///
    /// Returns `None` for commands and numerics outside the engine's closed
    /// event set, and for recognized commands whose required fields are
    /// missing (e.g. a JOIN without a source nick).
    pub fn decode(msg: &Message) -> Option<SessionEvent> {
        if let Some(response) = Response::from_command(&msg.command) {
            return Self::decode_numeric(response, msg);
        }

        match msg.command.to_ascii_uppercase().as_str() {
            "PING" => Some(SessionEvent::Ping {
                token: msg.trailing().unwrap_or_default().to_string(),
            }),
            "JOIN" => Some(SessionEvent::Join {
                nick: msg.source_nick()?.to_string(),
                channel: msg.arg(0)?.to_string(),
            }),
            "PART" => Some(SessionEvent::Part {
                nick: msg.source_nick()?.to_string(),
                channel: msg.arg(0)?.to_string(),
            }),
            "QUIT" => Some(SessionEvent::Quit {
                nick: msg.source_nick()?.to_string(),
            }),
            "NICK" => {
                let old = msg.source_nick()?.to_string();
                let new = msg.arg(0).unwrap_or(&old).to_string();
                Some(SessionEvent::NickChange { old, new })
            }
            "PRIVMSG" => Some(SessionEvent::Privmsg {
                nick: msg.source_nick()?.to_string(),
                target: msg.arg(0)?.to_string(),
                text: msg.arg(1).unwrap_or_default().to_string(),
            }),
            _ => None,
        }
    }

    fn decode_numeric(response: Response, msg: &Message) -> Option<SessionEvent> {
        match response {
            Response::RPL_WELCOME => Some(SessionEvent::Welcome {
                nick: msg.arg(0)?.to_string(),
            }),
            Response::ERR_NICKNAMEINUSE => Some(SessionEvent::NickInUse),
            Response::RPL_NAMREPLY => {
                // Parameter layouts vary: `<me> <sentinel> <chan> :<nicks>`
                // and 3-parameter forms with or without the sentinel. The
                // channel is the rightmost non-trailing token that is not a
                // sentinel.
                let (names, rest) = msg.params.split_last()?;
                let channel = rest
                    .iter()
                    .rev()
                    .find(|p| !LIST_SENTINELS.contains(&p.as_str()))?;
                Some(SessionEvent::NamesReply {
                    channel: channel.clone(),
                    nicks: names.split_whitespace().map(str::to_string).collect(),
                })
            }
            Response::RPL_ENDOFNAMES => {
                // `<me> <chan> :End of /NAMES list` - channel is second from
                // the end once the trailing text is dropped.
                let (_, rest) = msg.params.split_last()?;
                Some(SessionEvent::EndOfNames {
                    channel: rest.last()?.clone(),
                })
            }
            Response::RPL_LIST => {
                // `<me> <chan> <count> :<topic>`; count and topic may be
                // absent on sparse servers.
                Some(SessionEvent::ListEntry(ChannelListEntry {
                    name: msg.arg(1)?.to_string(),
                    users: msg.arg(2).and_then(|c| c.parse().ok()).unwrap_or(0),
                    topic: msg.arg(3).unwrap_or_default().to_string(),
                }))
            }
            Response::RPL_LISTEND => Some(SessionEvent::ListEnd),
            Response::RPL_TRYAGAIN => Some(SessionEvent::TryAgain {
                command: msg.arg(1).unwrap_or_default().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(raw: &str) -> Option<SessionEvent> {
        SessionEvent::decode(&raw.parse().unwrap())
    }

    #[test]
    fn test_decode_welcome() {
        assert_eq!(
            decode(":server 001 cord :Welcome to the network"),
            Some(SessionEvent::Welcome {
                nick: "cord".into()
            })
        );
    }

    #[test]
    fn test_decode_nick_in_use() {
        assert_eq!(
            decode(":server 433 * cord :Nickname is already in use"),
            Some(SessionEvent::NickInUse)
        );
    }

    #[test]
    fn test_decode_names_four_param_layout() {
        assert_eq!(
            decode(":server 353 me = #general :alice bob @carol"),
            Some(SessionEvent::NamesReply {
                channel: "#general".into(),
                nicks: vec!["alice".into(), "bob".into(), "@carol".into()],
            })
        );
    }

    #[test]
    fn test_decode_names_three_param_layout() {
        assert_eq!(
            decode(":server 353 #general :alice bob"),
            Some(SessionEvent::NamesReply {
                channel: "#general".into(),
                nicks: vec!["alice".into(), "bob".into()],
            })
        );
        // Sentinel-first form.
        assert_eq!(
            decode(":server 353 = #general :alice"),
            Some(SessionEvent::NamesReply {
                channel: "#general".into(),
                nicks: vec!["alice".into()],
            })
        );
    }

    #[test]
    fn test_decode_end_of_names() {
        assert_eq!(
            decode(":server 366 me #general :End of /NAMES list"),
            Some(SessionEvent::EndOfNames {
                channel: "#general".into()
            })
        );
    }

    #[test]
    fn test_decode_join_part_quit() {
        assert_eq!(
            decode(":alice!a@h JOIN #general"),
            Some(SessionEvent::Join {
                nick: "alice".into(),
                channel: "#general".into()
            })
        );
        // JOIN channel may arrive as a trailing parameter.
        assert_eq!(
            decode(":alice!a@h JOIN :#general"),
            Some(SessionEvent::Join {
                nick: "alice".into(),
                channel: "#general".into()
            })
        );
        assert_eq!(
            decode(":bob!b@h PART #general"),
            Some(SessionEvent::Part {
                nick: "bob".into(),
                channel: "#general".into()
            })
        );
        assert_eq!(
            decode(":bob!b@h QUIT :Leaving"),
            Some(SessionEvent::Quit { nick: "bob".into() })
        );
    }

    #[test]
    fn test_decode_join_without_source_is_dropped() {
        assert_eq!(decode("JOIN #general"), None);
    }

    #[test]
    fn test_decode_nick_change() {
        assert_eq!(
            decode(":alice!a@h NICK :alice2"),
            Some(SessionEvent::NickChange {
                old: "alice".into(),
                new: "alice2".into()
            })
        );
    }

    #[test]
    fn test_decode_privmsg() {
        assert_eq!(
            decode(":alice!a@h PRIVMSG #general :hello there"),
            Some(SessionEvent::Privmsg {
                nick: "alice".into(),
                target: "#general".into(),
                text: "hello there".into(),
            })
        );
    }

    #[test]
    fn test_decode_list() {
        assert_eq!(
            decode(":server 322 me #rust 42 :Rust talk"),
            Some(SessionEvent::ListEntry(ChannelListEntry {
                name: "#rust".into(),
                users: 42,
                topic: "Rust talk".into(),
            }))
        );
        assert_eq!(decode(":server 323 me :End of /LIST"), Some(SessionEvent::ListEnd));
    }

    #[test]
    fn test_decode_list_entry_without_topic() {
        assert_eq!(
            decode(":server 322 me #quiet 3"),
            Some(SessionEvent::ListEntry(ChannelListEntry {
                name: "#quiet".into(),
                users: 3,
                topic: String::new(),
            }))
        );
    }

    #[test]
    fn test_decode_ping() {
        assert_eq!(
            decode("PING :token123"),
            Some(SessionEvent::Ping {
                token: "token123".into()
            })
        );
    }

    #[test]
    fn test_decode_noise_is_none() {
        assert_eq!(decode(":server 002 cord :Your host is server"), None);
        assert_eq!(decode(":server 372 cord :- motd line"), None);
        assert_eq!(decode(":server NOTICE * :*** Looking up your hostname"), None);
    }
}
