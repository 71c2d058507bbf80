//! Signed `auth-token` values: `<payload>.<mac>`, both base64url without
//! padding. The payload is JSON `{id, issued, nonce}` and the MAC is
//! HMAC-SHA512 over the payload as it appears in the token.

use super::*;
use chrono::{DateTime, Duration, Utc};
use crypto::hmac::Hmac;
use crypto::mac::{Mac, MacResult};
use crypto::sha2::Sha512;
use data_encoding::BASE64URL_NOPAD;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Serialize, Deserialize};

pub const NONCE_BITS: usize = 128;
pub const HMAC_KEY_BYTES: usize = 32;
pub const COOKIE_NAME: &str = "auth-token";

/// Clock skew tolerated for tokens issued "in the future".
pub const MAX_CLOCK_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSession {
    pub user_id: i32,
    pub issued: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    id: i32,
    issued: DateTime<Utc>,
    nonce: String,
}

pub fn fresh_nonce() -> Result<[u8; NONCE_BITS / 8]> {
    let mut nonce = [0_u8; NONCE_BITS / 8];
    OsRng.try_fill_bytes(&mut nonce)
        .chain_err(|| "Unable to connect to the system random number generator!")?;
    Ok(nonce)
}

fn mac(payload: &str, hmac_key: &[u8]) -> MacResult {
    let mut hmac_maker = Hmac::new(Sha512::new(), hmac_key);
    hmac_maker.input(payload.as_bytes());
    hmac_maker.result()
}

pub fn issue(user_id: i32, now: DateTime<Utc>, hmac_key: &[u8]) -> Result<String> {
    let payload = Payload {
        id: user_id,
        issued: now,
        nonce: BASE64URL_NOPAD.encode(&fresh_nonce()?),
    };
    let payload = BASE64URL_NOPAD.encode(serde_json::to_string(&payload)?.as_bytes());
    let mac = BASE64URL_NOPAD.encode(mac(&payload, hmac_key).code());

    Ok(format!("{}.{}", payload, mac))
}

/// Checks the signature first; only a genuine payload is parsed.
pub fn verify(token: &str, hmac_key: &[u8], now: DateTime<Utc>, max_age: Duration) -> Result<UserSession> {
    let mut parts = token.trim().splitn(2, '.');
    let (payload, mac_b64) = match (parts.next(), parts.next()) {
        (Some(p), Some(m)) if !p.is_empty() && !m.is_empty() => (p, m),
        _ => bail!(ErrorKind::BadToken),
    };

    let claimed_mac = BASE64URL_NOPAD.decode(mac_b64.as_bytes())
        .map_err(|_| Error::from_kind(ErrorKind::BadToken))?;

    if mac(payload, hmac_key) != MacResult::new_from_owned(claimed_mac) {
        bail!(ErrorKind::AuthError);
    }

    let json = BASE64URL_NOPAD.decode(payload.as_bytes())
        .map_err(|_| Error::from_kind(ErrorKind::BadToken))?;
    let payload: Payload = serde_json::from_slice(&json)
        .map_err(|_| Error::from_kind(ErrorKind::BadToken))?;

    if payload.issued > now + Duration::seconds(MAX_CLOCK_SKEW_SECS) {
        bail!(ErrorKind::BadToken);
    }
    if now.signed_duration_since(payload.issued) > max_age {
        bail!(ErrorKind::TokenExpired);
    }

    Ok(UserSession { user_id: payload.id, issued: payload.issued })
}

/// Decodes a base64 HMAC key and checks its length.
pub fn decode_key(key_base64: &str) -> Result<Vec<u8>> {
    let key = data_encoding::BASE64.decode(key_base64.trim().as_bytes())?;
    if key.len() != HMAC_KEY_BYTES {
        bail!(ErrorKind::InvalidInput(format!("the HMAC key must be {} bytes, got {}", HMAC_KEY_BYTES, key.len())));
    }
    Ok(key)
}

#[cfg(test)]
const TEST_KEY: &[u8] = b"0123456789abcdef0123456789abcdef";

#[cfg(test)]
fn test_now() -> DateTime<Utc> {
    use chrono::TimeZone;
    Utc.ymd(2026, 10, 16).and_hms(12, 0, 0)
}

#[test]
fn test_issue_and_verify() {
    let token = issue(42, test_now(), TEST_KEY).unwrap();
    assert_eq!(token.matches('.').count(), 1);
    let sess = verify(&token, TEST_KEY, test_now() + Duration::hours(1), Duration::days(14)).unwrap();
    assert_eq!(sess, UserSession { user_id: 42, issued: test_now() });
}

#[test]
fn test_tokens_are_unique() {
    let a = issue(1, test_now(), TEST_KEY).unwrap();
    let b = issue(1, test_now(), TEST_KEY).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_forged_token() {
    let token = issue(42, test_now(), TEST_KEY).unwrap();
    let other_key = b"fedcba9876543210fedcba9876543210";
    match verify(&token, other_key, test_now(), Duration::days(14)) {
        Err(Error(ErrorKind::AuthError, _)) => (),
        other => panic!("Expected AuthError, got {:?}", other),
    }

    // Swap in a payload claiming another user but keep the old MAC.
    let mac_part = token.split('.').nth(1).unwrap();
    let forged_payload = BASE64URL_NOPAD.encode(
        br#"{"id":1,"issued":"2026-10-16T12:00:00Z","nonce":"AAAA"}"#);
    let forged = format!("{}.{}", forged_payload, mac_part);
    match verify(&forged, TEST_KEY, test_now(), Duration::days(14)) {
        Err(Error(ErrorKind::AuthError, _)) => (),
        other => panic!("Expected AuthError, got {:?}", other),
    }
}

#[test]
fn test_malformed_token() {
    for token in &["", "abc", ".", "abc.", ".abc", "abc.!!!"] {
        match verify(token, TEST_KEY, test_now(), Duration::days(14)) {
            Err(Error(ErrorKind::BadToken, _)) => (),
            other => panic!("Expected BadToken for {:?}, got {:?}", token, other),
        }
    }
}

#[test]
fn test_expired_token() {
    let token = issue(42, test_now(), TEST_KEY).unwrap();
    match verify(&token, TEST_KEY, test_now() + Duration::days(15), Duration::days(14)) {
        Err(Error(ErrorKind::TokenExpired, _)) => (),
        other => panic!("Expected TokenExpired, got {:?}", other),
    }
    match verify(&token, TEST_KEY, test_now() - Duration::hours(1), Duration::days(14)) {
        Err(Error(ErrorKind::BadToken, _)) => (),
        other => panic!("Expected BadToken, got {:?}", other),
    }
}

#[test]
fn test_decode_key() {
    let encoded = data_encoding::BASE64.encode(TEST_KEY);
    assert_eq!(decode_key(&encoded).unwrap(), TEST_KEY.to_vec());
    assert!(decode_key(&data_encoding::BASE64.encode(b"short")).is_err());
    assert!(decode_key("not base64!").is_err());
}
