//! Signed session tokens: `user_id|expiry|signature`.
//!
//! Login lives outside this workspace. Whatever issues sessions signs them with
//! the shared secret; the web server only verifies.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const COOKIE_NAME: &str = "msr_session";
pub const SESSION_DURATION_SECS: i64 = 7 * 24 * 3600; // 7 days

/// Create a signed session value for `user_id`.
pub fn create_session(user_id: i64, secret: &str) -> String {
    let expiry = chrono::Utc::now().timestamp() + SESSION_DURATION_SECS;
    signed_value(user_id, expiry, secret)
}

/// Build the Set-Cookie header value.
/// In release builds, adds `Secure` flag to prevent transmission over HTTP.
pub fn session_cookie(user_id: i64, secret: &str) -> String {
    let value = create_session(user_id, secret);
    let secure = if cfg!(debug_assertions) { "" } else { "; Secure" };
    format!(
        "{COOKIE_NAME}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={SESSION_DURATION_SECS}{secure}"
    )
}

/// Verify a session value. Returns the user id if valid and unexpired.
pub fn verify_session(value: &str, secret: &str) -> Option<i64> {
    let parts: Vec<&str> = value.splitn(3, '|').collect();
    if parts.len() != 3 {
        return None;
    }

    let (user_id, expiry, sig) = (parts[0], parts[1], parts[2]);

    let expected_sig = sign(&format!("{user_id}|{expiry}"), secret);
    if !constant_time_eq(sig.as_bytes(), expected_sig.as_bytes()) {
        return None;
    }

    let expiry: i64 = expiry.parse().ok()?;
    if chrono::Utc::now().timestamp() > expiry {
        return None;
    }

    user_id.parse().ok()
}

fn signed_value(user_id: i64, expiry: i64, secret: &str) -> String {
    let payload = format!("{user_id}|{expiry}");
    let sig = sign(&payload, secret);
    format!("{payload}|{sig}")
}

fn sign(payload: &str, secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time comparison to prevent timing attacks.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
