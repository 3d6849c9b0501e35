//! Fixed-shape claim set: `{"sub":"<subject>","iat":<int>,"exp":<int>}`.
//!
//! This is NOT a general JSON parser. `decode` locates the three known keys by
//! pattern and understands only what `encode` produces (plus optional
//! whitespace around `:`). Do not extend it to new claim shapes without
//! revisiting the escaping rules.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Result of pattern-based decoding. Absent (or unparseable) keys are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawClaims {
    pub sub: Option<String>,
    pub iat: Option<i64>,
    pub exp: Option<i64>,
}

pub fn encode(claims: &Claims) -> String {
    format!(
        r#"{{"sub":"{}","iat":{},"exp":{}}}"#,
        escape(&claims.sub),
        claims.iat,
        claims.exp
    )
}

/// Two-character escapes for `\` and `"` only.
fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

pub fn decode(payload: &str) -> RawClaims {
    RawClaims {
        sub: find_string(payload, "sub").map(str::to_owned),
        iat: find_integer(payload, "iat"),
        exp: find_integer(payload, "exp"),
    }
}

/// Returns the text right after `"key"` + optional whitespace + `:` + optional
/// whitespace, for the first occurrence of `"key"` used as a key.
fn value_after_key<'a>(json: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("\"{key}\"");
    let mut from = 0;

    while let Some(pos) = json[from..].find(&needle) {
        let after = &json[from + pos + needle.len()..];
        if let Some(rest) = after.trim_start().strip_prefix(':') {
            return Some(rest.trim_start());
        }
        // matched a value that happens to equal the key name
        from += pos + needle.len();
    }

    None
}

/// Quoted string value, taken verbatim up to the next `"` (no unescaping).
fn find_string<'a>(json: &'a str, key: &str) -> Option<&'a str> {
    let rest = value_after_key(json, key)?.strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(&rest[..end])
}

/// Non-negative integer of ASCII digits. Overflow counts as absent.
fn find_integer(json: &str, key: &str) -> Option<i64> {
    let rest = value_after_key(json, key)?;
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    rest[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str, iat: i64, exp: i64) -> Claims {
        Claims {
            sub: sub.to_string(),
            iat,
            exp,
        }
    }

    #[test]
    fn encode_is_byte_exact() {
        assert_eq!(
            encode(&claims("a@b.com", 1_700_000_000, 1_700_003_600)),
            r#"{"sub":"a@b.com","iat":1700000000,"exp":1700003600}"#
        );
    }

    #[test]
    fn encode_escapes_quote_and_backslash() {
        assert_eq!(
            encode(&claims(r#"a"b\c"#, 1, 2)),
            r#"{"sub":"a\"b\\c","iat":1,"exp":2}"#
        );
    }

    #[test]
    fn decode_reads_encoder_output() {
        let raw = decode(&encode(&claims("a@b.com", 10, 20)));
        assert_eq!(
            raw,
            RawClaims {
                sub: Some("a@b.com".into()),
                iat: Some(10),
                exp: Some(20),
            }
        );
    }

    #[test]
    fn decode_ignores_key_order_and_whitespace() {
        let raw = decode(r#"{ "exp" : 20, "iat":10 ,"sub" :  "x@y.z" }"#);
        assert_eq!(raw.sub.as_deref(), Some("x@y.z"));
        assert_eq!(raw.iat, Some(10));
        assert_eq!(raw.exp, Some(20));
    }

    #[test]
    fn missing_keys_are_absent() {
        let raw = decode(r#"{"sub":"x"}"#);
        assert_eq!(raw.sub.as_deref(), Some("x"));
        assert_eq!(raw.iat, None);
        assert_eq!(raw.exp, None);

        assert_eq!(decode(""), RawClaims::default());
        assert_eq!(decode("not json at all"), RawClaims::default());
    }

    #[test]
    fn value_equal_to_key_name_is_skipped() {
        let raw = decode(r#"{"sub":"exp","iat":1,"exp":99}"#);
        assert_eq!(raw.sub.as_deref(), Some("exp"));
        assert_eq!(raw.exp, Some(99));
    }

    #[test]
    fn wrong_value_types_are_absent() {
        let raw = decode(r#"{"sub":42,"iat":"1","exp":-5}"#);
        assert_eq!(raw, RawClaims::default());
    }

    #[test]
    fn integer_overflow_is_absent() {
        let raw = decode(r#"{"exp":99999999999999999999999}"#);
        assert_eq!(raw.exp, None);
    }

    #[test]
    fn subject_is_not_unescaped() {
        // stops at the first quote; escapes are left as-is
        let raw = decode(r#"{"sub":"a\\b","iat":1,"exp":2}"#);
        assert_eq!(raw.sub.as_deref(), Some(r"a\\b"));
    }
}
