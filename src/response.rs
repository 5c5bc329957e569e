//! IRC numeric response codes consumed by the session engine.
//!
//! This is deliberately a closed subset of the RFC 2812 numerics: exactly
//! the codes the engine reacts to. Every other numeric decodes to "not an
//! event" and is dropped as protocol noise.
//!
//! # Reference
//! - RFC 2812: Internet Relay Chat: Client Protocol
//! - Modern IRC documentation: <https://modern.ircdocs.horse/>

#![allow(non_camel_case_types)]

/// IRC server response code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum Response {
    /// 001 - Welcome to the IRC network; registration is complete.
    RPL_WELCOME = 1,
    /// 263 - Server asks the client to retry a command later.
    RPL_TRYAGAIN = 263,
    /// 322 - One entry of the channel directory (LIST).
    RPL_LIST = 322,
    /// 323 - End of the channel directory.
    RPL_LISTEND = 323,
    /// 353 - One line of a channel's member list (NAMES).
    RPL_NAMREPLY = 353,
    /// 366 - End of a channel's member list.
    RPL_ENDOFNAMES = 366,
    /// 433 - Requested nickname is already in use.
    ERR_NICKNAMEINUSE = 433,
}

impl Response {
    /// Get the numeric code for this response.
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Look up a response from its numeric code.
    ///
    /// Returns `None` for codes the engine does not consume.
    pub fn from_code(code: u16) -> Option<Response> {
        match code {
            1 => Some(Response::RPL_WELCOME),
            263 => Some(Response::RPL_TRYAGAIN),
            322 => Some(Response::RPL_LIST),
            323 => Some(Response::RPL_LISTEND),
            353 => Some(Response::RPL_NAMREPLY),
            366 => Some(Response::RPL_ENDOFNAMES),
            433 => Some(Response::ERR_NICKNAMEINUSE),
            _ => None,
        }
    }

    /// Parse a command token as a response code.
    ///
    /// Only 3-digit tokens are considered; verbs return `None`.
    pub fn from_command(command: &str) -> Option<Response> {
        if command.len() == 3 {
            command.parse::<u16>().ok().and_then(Response::from_code)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_values() {
        assert_eq!(Response::RPL_WELCOME.code(), 1);
        assert_eq!(Response::RPL_NAMREPLY.code(), 353);
        assert_eq!(Response::ERR_NICKNAMEINUSE.code(), 433);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Response::from_code(1), Some(Response::RPL_WELCOME));
        assert_eq!(Response::from_code(366), Some(Response::RPL_ENDOFNAMES));
        assert_eq!(Response::from_code(999), None);
    }

    #[test]
    fn test_from_command() {
        assert_eq!(Response::from_command("001"), Some(Response::RPL_WELCOME));
        assert_eq!(
            Response::from_command("433"),
            Some(Response::ERR_NICKNAMEINUSE)
        );
        assert_eq!(Response::from_command("PRIVMSG"), None);
        assert_eq!(Response::from_command("002"), None);
    }
}
