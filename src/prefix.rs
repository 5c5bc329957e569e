//! IRC message prefix types.
//!
//! A prefix identifies the origin of a message: either a server name or a
//! user's `nick!user@host` mask. The leading `:` is framing and is stripped
//! by the message parser before a prefix ever reaches this type.
//!
//! # Reference
//! - RFC 2812 Section 2.3.1: Message format

use std::fmt;

/// The origin of an IRC message.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Prefix {
    /// Server name (e.g., "irc.example.com").
    ServerName(String),
    /// User prefix: (nickname, username, hostname).
    Nickname(String, String, String),
}

impl Prefix {
    /// Parse a prefix string (without the leading `:`).
    ///
    /// This is a lenient parser: a dot before any `!` or `@` marks the
    /// prefix as a server name, otherwise it is split on `!` and `@` into
    /// nick, user, and host components. Components may be empty.
    pub fn parse(s: &str) -> Self {
        #[derive(Copy, Clone, Eq, PartialEq)]
        enum Part {
            Name,
            User,
            Host,
        }

        let mut name = String::new();
        let mut user = String::new();
        let mut host = String::new();
        let mut part = Part::Name;
        let mut is_server = false;

        for c in s.chars() {
            if c == '.' && part == Part::Name {
                is_server = true;
            }

            match c {
                '!' if part == Part::Name => {
                    is_server = false;
                    part = Part::User;
                }
                '@' if part != Part::Host => {
                    is_server = false;
                    part = Part::Host;
                }
                _ => {
                    match part {
                        Part::Name => &mut name,
                        Part::User => &mut user,
                        Part::Host => &mut host,
                    }
                    .push(c);
                }
            }
        }

        if is_server {
            Prefix::ServerName(name)
        } else {
            Prefix::Nickname(name, user, host)
        }
    }

    /// Get the nickname if this is a user prefix.
    pub fn nick(&self) -> Option<&str> {
        match self {
            Prefix::Nickname(nick, _, _) if !nick.is_empty() => Some(nick),
            _ => None,
        }
    }

    /// Get the hostname, for either prefix form.
    pub fn host(&self) -> Option<&str> {
        match self {
            Prefix::ServerName(name) if !name.is_empty() => Some(name),
            Prefix::Nickname(_, _, host) if !host.is_empty() => Some(host),
            _ => None,
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::ServerName(name) => write!(f, "{}", name),
            Prefix::Nickname(nick, user, host) => {
                write!(f, "{}", nick)?;
                if !user.is_empty() {
                    write!(f, "!{}", user)?;
                }
                if !host.is_empty() {
                    write!(f, "@{}", host)?;
                }
                Ok(())
            }
        }
    }
}
