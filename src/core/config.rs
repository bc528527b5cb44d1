//! Session initialisation.
//!
//! A session is reproduced exactly from one handshake token:
//!
//! ```text
//! <variant-name> <player-count> <random-seed> [<rules-revision>]
//! ```
//!
//! Records made before revisions existed carry only three fields; those
//! replay under [`LEGACY_REVISION`]. New sessions default to
//! [`DEFAULT_REVISION`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{ParseError, ParseResult};

/// Revision assumed when the init string has no revision field.
pub const LEGACY_REVISION: u32 = 0;

/// Revision used for newly created sessions.
pub const DEFAULT_REVISION: u32 = 1;

/// Everything needed to rebuild the initial board.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionInit {
    /// Variant name, resolved by the game.
    pub variant: String,
    pub player_count: usize,
    /// Seeds only the variant's initial content, never play.
    pub seed: u64,
    pub revision: u32,
}

impl Default for SessionInit {
    fn default() -> Self {
        Self {
            variant: "dipole".to_string(),
            player_count: 2,
            seed: 0,
            revision: DEFAULT_REVISION,
        }
    }
}

impl SessionInit {
    /// New init for `variant` with default players, seed and revision.
    pub fn new(variant: impl Into<String>) -> Self {
        Self {
            variant: variant.into(),
            ..Self::default()
        }
    }

    pub fn with_players(mut self, player_count: usize) -> Self {
        self.player_count = player_count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_revision(mut self, revision: u32) -> Self {
        self.revision = revision;
        self
    }

    /// Parse the handshake token.
    ///
    /// ```
    /// use rust_dipole::core::SessionInit;
    ///
    /// let init = SessionInit::parse("dipole-s 2 734687 1").unwrap();
    /// assert_eq!(init.variant, "dipole-s");
    /// assert_eq!(init.seed, 734687);
    /// assert_eq!(init.to_string(), "dipole-s 2 734687 1");
    /// ```
    pub fn parse(text: &str) -> ParseResult<Self> {
        let mut tokens = text.split_whitespace();
        let variant = tokens.next().ok_or(ParseError::Empty)?;
        let player_count = parse_field(tokens.next(), "player count", text)?;
        let seed = parse_field(tokens.next(), "seed", text)?;
        let revision = match tokens.next() {
            Some(token) => parse_field(Some(token), "revision", text)?,
            None => LEGACY_REVISION,
        };
        if let Some(token) = tokens.next() {
            return Err(ParseError::Trailing {
                token: token.to_string(),
                text: text.to_string(),
            });
        }

        Ok(Self {
            variant: variant.to_ascii_lowercase(),
            player_count,
            seed,
            revision,
        })
    }
}

fn parse_field<T: std::str::FromStr>(
    token: Option<&str>,
    what: &'static str,
    text: &str,
) -> ParseResult<T> {
    let token = token.ok_or_else(|| ParseError::Missing {
        what,
        text: text.to_string(),
    })?;
    token.parse().map_err(|_| ParseError::BadToken {
        what,
        token: token.to_string(),
    })
}

impl fmt::Display for SessionInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.variant, self.player_count, self.seed, self.revision
        )
    }
}

impl std::str::FromStr for SessionInit {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_init() {
        let init = SessionInit::default();
        assert_eq!(init.to_string(), "dipole 2 0 1");
    }

    #[test]
    fn test_builder() {
        let init = SessionInit::new("dipole-10").with_seed(99).with_revision(0);
        assert_eq!(init.variant, "dipole-10");
        assert_eq!(init.player_count, 2);
        assert_eq!(init.to_string(), "dipole-10 2 99 0");
    }

    #[test]
    fn test_parse_roundtrip() {
        let text = "dipole-r 2 734687 1";
        assert_eq!(SessionInit::parse(text).unwrap().to_string(), text);
    }

    #[test]
    fn test_missing_revision_is_legacy() {
        let init = SessionInit::parse("Dipole 2 17").unwrap();
        assert_eq!(init.variant, "dipole");
        assert_eq!(init.revision, LEGACY_REVISION);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(SessionInit::parse(""), Err(ParseError::Empty));
        assert!(matches!(
            SessionInit::parse("dipole"),
            Err(ParseError::Missing { what: "player count", .. })
        ));
        assert!(matches!(
            SessionInit::parse("dipole two 5"),
            Err(ParseError::BadToken { what: "player count", .. })
        ));
        assert!(matches!(
            SessionInit::parse("dipole 2 5 1 9"),
            Err(ParseError::Trailing { .. })
        ));
    }

    #[test]
    fn test_serde() {
        let init = SessionInit::new("dipole-s").with_seed(3);
        let json = serde_json::to_string(&init).unwrap();
        assert_eq!(serde_json::from_str::<SessionInit>(&json).unwrap(), init);
    }
}
