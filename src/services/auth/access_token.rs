use chrono::{DateTime, Utc};
use tracing::debug;

use crate::services::auth::{
    claims::{self, Claims},
    codec,
    error::{AuthError, IssueError},
    signer::HmacSigner,
};

/// Mints and verifies HS256 bearer tokens.
///
/// - Secret and validity are fixed at construction (no rotation).
/// - `verify` is pure: no I/O, no clock reads, safe to call from any task.
#[derive(Clone)]
pub struct AuthService {
    signer: HmacSigner,
    validity_ms: u64,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("signer", &self.signer)
            .field("validity_ms", &self.validity_ms)
            .finish()
    }
}

impl AuthService {
    pub fn new(secret: impl AsRef<[u8]>, validity_ms: u64) -> Self {
        Self {
            signer: HmacSigner::new(secret),
            validity_ms,
        }
    }

    /// Issue a token for `subject` valid from now for the configured duration.
    pub fn issue_token(&self, subject: &str) -> Result<String, IssueError> {
        self.issue_token_at(subject, Utc::now())
    }

    /// Same as [`issue_token`](Self::issue_token) with an explicit clock.
    ///
    /// `iat`/`exp` are computed in milliseconds and truncated to seconds, so
    /// `exp = floor((now_ms + validity_ms) / 1000)`.
    pub fn issue_token_at(&self, subject: &str, now: DateTime<Utc>) -> Result<String, IssueError> {
        validate_subject(subject)?;

        // claim integers are unsigned on the wire; a negative iat could never verify
        let now_ms = now.timestamp_millis();
        if now_ms < 0 {
            return Err(IssueError::ClockBeforeEpoch);
        }
        let exp_ms = now_ms.saturating_add(i64::try_from(self.validity_ms).unwrap_or(i64::MAX));

        let claims = Claims {
            sub: subject.to_string(),
            iat: now_ms.div_euclid(1000),
            exp: exp_ms.div_euclid(1000),
        };

        let signing_input = codec::encode_signing_input(&claims::encode(&claims));
        let signature = self.signer.sign(signing_input.as_bytes());

        debug!(iat = claims.iat, exp = claims.exp, "issued access token");

        Ok(codec::assemble(&signing_input, &signature))
    }

    /// Decode → verify signature → read claims → check expiry.
    ///
    /// `now` is unix seconds. A token is valid while `now < exp`.
    pub fn verify(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let decoded = codec::decode(token)?;

        if !self
            .signer
            .verify(decoded.signing_input.as_bytes(), &decoded.signature)
        {
            return Err(AuthError::SignatureInvalid);
        }

        let payload = std::str::from_utf8(&decoded.payload).map_err(|_| AuthError::Malformed)?;
        let claims = required_claims(claims::decode(payload))?;

        if now >= claims.exp {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }

    /// Read the expiry of a token whose signature is valid, ignoring the clock.
    ///
    /// Used when recording a revocation: the record only needs to live as long
    /// as the token itself.
    pub fn expires_at(&self, token: &str) -> Option<i64> {
        self.verify(token, i64::MIN).ok().map(|c| c.exp)
    }
}

fn required_claims(raw: claims::RawClaims) -> Result<Claims, AuthError> {
    let (Some(sub), Some(exp)) = (raw.sub, raw.exp) else {
        return Err(AuthError::Malformed);
    };
    if sub.is_empty() {
        return Err(AuthError::Malformed);
    }

    // tokens minted here always carry iat; tolerate its absence but never iat > exp
    let iat = raw.iat.unwrap_or(exp);
    if iat > exp {
        return Err(AuthError::Malformed);
    }

    Ok(Claims { sub, iat, exp })
}

/// Subjects are expected to be email-like identifiers. Characters that would
/// need escaping (or that the claim decoder cannot round-trip) are refused
/// here instead of being carried into the payload.
fn validate_subject(subject: &str) -> Result<(), IssueError> {
    if subject.is_empty() {
        return Err(IssueError::InvalidSubject("empty"));
    }
    if subject.contains(['"', '\\']) {
        return Err(IssueError::InvalidSubject("contains quote or backslash"));
    }
    if subject.chars().any(char::is_control) {
        return Err(IssueError::InvalidSubject("contains control character"));
    }
    Ok(())
}
