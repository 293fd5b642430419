pub mod auth_token;

use std::fmt;

/// A token that was presented but rejected is always `TokenInvalid`, whatever the cause.
#[derive(Debug, PartialEq, Eq)]
pub enum TokenError {
    TokenInvalid,
    TokenMissing,
}

impl std::error::Error for TokenError {}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::TokenInvalid => write!(f, "TokenInvalid"),
            TokenError::TokenMissing => write!(f, "TokenMissing"),
        }
    }
}
