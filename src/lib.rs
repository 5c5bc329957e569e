//! # slirc-session
//!
//! A client-side IRC session engine: one connection's worth of identity
//! negotiation, channel membership tracking, and event dispatch.
//!
//! The core is sans-IO. An [`Engine`] consumes raw protocol lines (or
//! decoded [`SessionEvent`]s) and produces [`Step`]s: commands to send and
//! [`SessionNotice`]s for the application. The `tokio` feature (default)
//! adds a [`Client`] driver that runs the engine over a TCP connection as a
//! single reactor task.
//!
//! What the engine owns:
//!
//! - Registration with bounded, randomized nickname-collision retry
//! - Per-channel member sets reconciled from JOIN/PART/QUIT/NICK and
//!   multi-line NAMES bursts
//! - Channel directory (LIST) aggregation
//! - Keep-alive (PING/PONG), answered before any application work
//!
//! Transport concerns below line framing, TLS, and reconnection policy are
//! out of scope; a disconnected session is discarded and a new one built.
//!
//! ## Quick start (sans-IO)
//!
//! ```rust
//! use slirc_session::{Engine, SessionConfig, SessionNotice, Step};
//!
//! let mut engine = Engine::new(SessionConfig {
//!     nickname: "cord".to_string(),
//!     username: "cord".to_string(),
//!     realname: "Cord".to_string(),
//! });
//!
//! // Handshake to send: NICK + USER.
//! let _startup = engine.start();
//!
//! // Feed server lines; act on the resulting steps.
//! let steps = engine.handle_line(":irc.example.net 001 cord :Welcome");
//! assert!(matches!(
//!     steps[0],
//!     Step::Notify(SessionNotice::NickStatus { confirmed: true, .. })
//! ));
//! ```
//!
//! ## Quick start (tokio driver)
//!
//! ```rust,no_run
//! use slirc_session::{Client, SessionConfig, SessionNotice};
//!
//! # async fn example() -> Result<(), slirc_session::SessionError> {
//! let config = SessionConfig {
//!     nickname: "cord".to_string(),
//!     username: "cord".to_string(),
//!     realname: "Cord".to_string(),
//! };
//! let (client, mut notices) = Client::connect("irc.example.net:6667", config).await?;
//! client.join_channel("#general");
//!
//! while let Some(notice) = notices.recv().await {
//!     if let SessionNotice::Message { nick, target, text } = notice {
//!         println!("<{}> {}: {}", target, nick, text);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod command;
pub mod engine;
pub mod error;
pub mod event;
pub mod message;
pub mod nick;
pub mod prefix;
pub mod registration;
pub mod response;
pub mod session;

#[cfg(feature = "tokio")]
pub mod client;
#[cfg(feature = "tokio")]
pub mod codec;

pub use self::command::Command;
pub use self::engine::{Engine, SessionNotice, Step};
pub use self::error::{MessageParseError, ProtocolError, SessionError};
pub use self::event::{ChannelListEntry, SessionEvent};
pub use self::message::Message;
pub use self::nick::{collision_candidate, NickExt, MAX_NICK_LEN};
pub use self::prefix::Prefix;
pub use self::registration::{Registrar, RegistrationState};
pub use self::response::Response;
pub use self::session::{ChannelState, Session, SessionConfig, MAX_NICK_ATTEMPTS};

#[cfg(feature = "tokio")]
pub use self::client::Client;
#[cfg(feature = "tokio")]
pub use self::codec::{LineCodec, MAX_LINE_LEN};
