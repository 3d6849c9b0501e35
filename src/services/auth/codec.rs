//! Three-segment token codec.
//!
//! Wire form: `base64url(header) "." base64url(payload) "." base64url(signature)`,
//! URL-safe alphabet without `=` padding. The header is a constant; this module
//! never looks inside the payload (see `claims`).

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::services::auth::error::AuthError;

/// The only header this service ever emits or accepts.
pub const HEADER_JSON: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Upper bound on the raw token length; anything longer is rejected unread.
pub const MAX_TOKEN_LEN: usize = 8 * 1024;

/// A structurally valid token split into its parts.
///
/// `signing_input` is borrowed straight from the presented string so the
/// signature is checked over the exact bytes the client sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken<'a> {
    pub signing_input: &'a str,
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

pub fn b64url_encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

fn b64url_decode(segment: &str) -> Result<Vec<u8>, AuthError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::Malformed)
}

/// Build `base64url(header) "." base64url(payload)`.
pub fn encode_signing_input(payload_json: &str) -> String {
    format!(
        "{}.{}",
        b64url_encode(HEADER_JSON.as_bytes()),
        b64url_encode(payload_json.as_bytes())
    )
}

/// Append the signature segment to a signing input.
pub fn assemble(signing_input: &str, signature: &[u8]) -> String {
    format!("{}.{}", signing_input, b64url_encode(signature))
}

/// Split and base64url-decode a token string.
///
/// Fails with `Malformed` unless there are exactly three segments, each valid
/// base64url, and the header is the fixed one. Never panics on empty or
/// oversized input.
pub fn decode(token: &str) -> Result<DecodedToken<'_>, AuthError> {
    if token.is_empty() || token.len() > MAX_TOKEN_LEN {
        return Err(AuthError::Malformed);
    }

    let mut parts = token.split('.');
    let (Some(header_seg), Some(payload_seg), Some(sig_seg), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::Malformed);
    };

    let header = b64url_decode(header_seg)?;
    if header != HEADER_JSON.as_bytes() {
        return Err(AuthError::Malformed);
    }

    let payload = b64url_decode(payload_seg)?;
    let signature = b64url_decode(sig_seg)?;

    // header_seg + "." + payload_seg is a prefix of `token`
    let signing_input = &token[..header_seg.len() + 1 + payload_seg.len()];

    Ok(DecodedToken {
        signing_input,
        payload,
        signature,
    })
}
