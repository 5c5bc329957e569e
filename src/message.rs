//! IRC message decoding.
//!
//! A [`Message`] is the structured form of one raw protocol line: an
//! optional source prefix, a command token (alphabetic verb or 3-digit
//! numeric), and a parameter list. The `:` framing on the prefix and on the
//! trailing parameter is stripped during parsing, so consumers only ever
//! see clean tokens. IRCv3 tags are accepted on the wire and discarded;
//! nothing in this engine consumes them.

use std::fmt;
use std::str::FromStr;

use nom::{
    bytes::complete::{take_until, take_while1},
    character::complete::{char, space0},
    combinator::opt,
    sequence::preceded,
    IResult,
};
use smallvec::SmallVec;

use crate::error::{MessageParseError, ProtocolError};
use crate::prefix::Prefix;

/// An owned, decoded IRC message.
///
/// # Example
///
/// ```
/// use slirc_session::Message;
///
/// let msg: Message = ":alice!ali@host PRIVMSG #general :hello there"
///     .parse()
///     .unwrap();
/// assert_eq!(msg.command, "PRIVMSG");
/// assert_eq!(msg.params, vec!["#general", "hello there"]);
/// assert_eq!(msg.source_nick(), Some("alice"));
/// ```
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    /// Message source, if the line carried a prefix.
    pub prefix: Option<Prefix>,
    /// The command token, uppercased as received (verbs) or numeric.
    pub command: String,
    /// Command parameters, trailing parameter last with its `:` stripped.
    pub params: Vec<String>,
}

impl Message {
    /// Get the nickname of the message source, if the prefix is a user.
    pub fn source_nick(&self) -> Option<&str> {
        self.prefix.as_ref().and_then(Prefix::nick)
    }

    /// Get a parameter by index.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// Get the last parameter (the trailing parameter, when present).
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }
}

/// Parse IRCv3 message tags (the part after `@` and before the first space).
///
/// Tags are recognized so that tagged lines still decode, but the tag
/// content is thrown away.
fn parse_tags(input: &str) -> IResult<&str, &str> {
    preceded(char('@'), take_until(" "))(input)
}

/// Parse the message prefix (the part after `:` and before the first space).
fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

/// Parse the command token (1*letter or 3digit, per RFC 2812).
fn parse_command(input: &str) -> IResult<&str, &str> {
    let (rest, cmd) = take_while1(|c: char| c.is_alphanumeric())(input)?;

    let is_all_letters = cmd.chars().all(|c| c.is_ascii_alphabetic());
    let is_three_digits = cmd.len() == 3 && cmd.chars().all(|c| c.is_ascii_digit());

    if is_all_letters || is_three_digits {
        Ok((rest, cmd))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::AlphaNumeric,
        )))
    }
}

/// Parse the parameter list following the command.
///
/// Space-separated parameters up to the RFC 2812 cap of 15, with a final
/// `:`-prefixed trailing parameter that may contain spaces. Consecutive
/// spaces count as one separator.
fn parse_params(input: &str) -> SmallVec<[&str; 15]> {
    let mut params: SmallVec<[&str; 15]> = SmallVec::new();
    let mut rest = input;

    while rest.as_bytes().first() == Some(&b' ') {
        if params.len() >= 15 {
            break;
        }

        while rest.as_bytes().first() == Some(&b' ') {
            rest = &rest[1..];
        }

        if rest.is_empty() || rest.starts_with('\r') || rest.starts_with('\n') {
            break;
        }

        if rest.as_bytes().first() == Some(&b':') {
            // Trailing parameter: everything after `:` until line end.
            let after_colon = &rest[1..];
            let end = after_colon.find(['\r', '\n']).unwrap_or(after_colon.len());
            params.push(&after_colon[..end]);
            break;
        }

        let end = rest.find([' ', '\r', '\n']).unwrap_or(rest.len());
        let param = &rest[..end];
        if param.is_empty() {
            break;
        }
        params.push(param);
        rest = &rest[end..];
    }

    params
}

fn parse_message(input: &str) -> IResult<&str, Message> {
    let (input, _tags) = opt(parse_tags)(input)?;
    let (input, _) = space0(input)?;

    let (input, prefix) = opt(parse_prefix)(input)?;
    let (input, _) = space0(input)?;

    let (input, command) = parse_command(input)?;

    let params = parse_params(input);

    Ok((
        "",
        Message {
            prefix: prefix.map(Prefix::parse),
            command: command.to_string(),
            params: params.iter().map(|p| (*p).to_string()).collect(),
        },
    ))
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Message, Self::Err> {
        if s.trim_end_matches(['\r', '\n']).is_empty() {
            return Err(ProtocolError::InvalidMessage {
                string: s.to_owned(),
                cause: MessageParseError::EmptyMessage,
            });
        }

        match parse_message(s) {
            Ok((_, msg)) => Ok(msg),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                let position = s.len() - e.input.len();
                let cause = if e.input.trim_end_matches(['\r', '\n']).is_empty() {
                    MessageParseError::MissingCommand
                } else {
                    MessageParseError::ParseError { position }
                };
                Err(ProtocolError::InvalidMessage {
                    string: s.to_owned(),
                    cause,
                })
            }
            Err(nom::Err::Incomplete(_)) => Err(ProtocolError::InvalidMessage {
                string: s.to_owned(),
                cause: MessageParseError::ParseError { position: s.len() },
            }),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref prefix) = self.prefix {
            write!(f, ":{} ", prefix)?;
        }
        write!(f, "{}", self.command)?;

        if let Some((last, middle)) = self.params.split_last() {
            for param in middle {
                write!(f, " {}", param)?;
            }
            if last.is_empty() || last.contains(' ') || last.starts_with(':') {
                write!(f, " :{}", last)?;
            } else {
                write!(f, " {}", last)?;
            }
        }
        Ok(())
    }
}
