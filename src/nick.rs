//! Nickname validation and collision-candidate synthesis.
//!
//! # Reference
//! - RFC 2812 Section 2.3.1: Message format (nickname definition)

use rand::Rng;

/// Default maximum nickname length per RFC 2812.
pub const MAX_NICK_LEN: usize = 30;

/// Low end of the random collision suffix range.
const SUFFIX_MIN: u32 = 100;
/// High end of the random collision suffix range.
const SUFFIX_MAX: u32 = 9999;

/// Extension trait for checking if a string is a valid IRC nickname.
pub trait NickExt {
    /// Check if this string is a valid IRC nickname per RFC 2812.
    ///
    /// Valid nicknames:
    /// - First character: letter (a-z, A-Z) or special character `[\]^_`{|}`
    /// - Subsequent characters: letter, digit, special, or hyphen
    /// - Maximum length: [`MAX_NICK_LEN`]
    ///
    /// # Examples
    ///
    /// ```
    /// use slirc_session::NickExt;
    ///
    /// assert!("cord".is_valid_nick());
    /// assert!("[cool]".is_valid_nick());
    /// assert!(!"123nick".is_valid_nick());
    /// assert!(!"nick name".is_valid_nick());
    /// ```
    fn is_valid_nick(&self) -> bool;
}

/// Check if a character is a "special" character allowed in nicknames.
///
/// Per RFC 2812: `[ ] \ ` ^ _ { | }`
#[inline]
fn is_special(c: char) -> bool {
    matches!(c, '[' | ']' | '\\' | '`' | '_' | '^' | '{' | '|' | '}')
}

impl NickExt for &str {
    fn is_valid_nick(&self) -> bool {
        if self.is_empty() || self.len() > MAX_NICK_LEN {
            return false;
        }

        let mut chars = self.chars();

        let first = match chars.next() {
            Some(c) => c,
            None => return false,
        };

        if !first.is_ascii_alphabetic() && !is_special(first) {
            return false;
        }

        chars.all(|c| c.is_ascii_alphanumeric() || is_special(c) || c == '-')
    }
}

impl NickExt for String {
    fn is_valid_nick(&self) -> bool {
        self.as_str().is_valid_nick()
    }
}

/// Synthesize a collision-retry candidate from the desired base nickname.
///
/// Appends a random numeric suffix in 100-9999. A deterministic suffix
/// would collide predictably with other clients applying the same naive
/// strategy, so the range is wide and the draw is random. If the result
/// would exceed [`MAX_NICK_LEN`], the base is truncated so the full suffix
/// still fits.
pub fn collision_candidate(base: &str) -> String {
    collision_candidate_with(base, &mut rand::thread_rng())
}

/// [`collision_candidate`] with an injected RNG, for deterministic tests.
pub fn collision_candidate_with<R: Rng>(base: &str, rng: &mut R) -> String {
    let suffix = rng.gen_range(SUFFIX_MIN..=SUFFIX_MAX).to_string();
    let keep = MAX_NICK_LEN - suffix.len();
    let base: String = base.chars().take(keep).collect();
    format!("{}{}", base, suffix)
}
