/*
 * Responsibility
 * - Internal failure kinds of token authentication
 * - Kept for logs/diagnostics only: at the HTTP boundary every kind collapses
 *   into "request proceeds unauthenticated"
 */
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    SignatureInvalid,
    #[error("token expired")]
    Expired,
    #[error("token subject does not match resolved principal")]
    SubjectMismatch,
    #[error("token revoked")]
    Revoked,
    #[error("principal not found")]
    PrincipalNotFound,
}

impl AuthError {
    /// Stable label for structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Malformed => "malformed",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::Expired => "expired",
            AuthError::SubjectMismatch => "subject_mismatch",
            AuthError::Revoked => "revoked",
            AuthError::PrincipalNotFound => "principal_not_found",
        }
    }
}

/// Errors raised while minting a token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssueError {
    #[error("invalid subject: {0}")]
    InvalidSubject(&'static str),
    #[error("issue time is before the unix epoch")]
    ClockBeforeEpoch,
}
