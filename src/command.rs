//! Outgoing client commands.
//!
//! The closed set of commands this engine sends. `Display` produces the
//! wire form without the trailing `\r\n`; the codec appends framing.

use std::fmt;

/// A client-to-server IRC command.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    /// `NICK <nickname>` - request or change a nickname.
    Nick(String),
    /// `USER <username> 0 * :<realname>` - identity registration.
    User(String, String),
    /// `JOIN <channel>` - join a channel.
    Join(String),
    /// `PART <channel>` - leave a channel.
    Part(String),
    /// `PRIVMSG <target> :<text>` - message a channel or nickname.
    Privmsg(String, String),
    /// `LIST [pattern]` - request the server's channel directory.
    List(Option<String>),
    /// `PONG :<token>` - keep-alive reply.
    Pong(String),
    /// `QUIT [:<message>]` - end the session.
    Quit(Option<String>),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Nick(nick) => write!(f, "NICK {}", nick),
            Command::User(username, realname) => {
                write!(f, "USER {} 0 * :{}", username, realname)
            }
            Command::Join(channel) => write!(f, "JOIN {}", channel),
            Command::Part(channel) => write!(f, "PART {}", channel),
            Command::Privmsg(target, text) => write!(f, "PRIVMSG {} :{}", target, text),
            Command::List(Some(pattern)) => write!(f, "LIST {}", pattern),
            Command::List(None) => write!(f, "LIST"),
            Command::Pong(token) => write!(f, "PONG :{}", token),
            Command::Quit(Some(message)) => write!(f, "QUIT :{}", message),
            Command::Quit(None) => write!(f, "QUIT"),
        }
    }
}
