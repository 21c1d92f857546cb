use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::modules::user::repository::Customer;

type HmacSha256 = Hmac<Sha256>;

/// Matches the "expires in 1 hour" wording of the reset email.
pub const RESET_TOKEN_MAX_AGE_SECS: i64 = 3600;

fn to_base36(mut n: i64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n <= 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 digits are ASCII")
}

fn signature(secret: &str, customer: &Customer, timestamp: i64) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any size");
    // Binding the current password hash makes the token single-use in
    // effect: a successful reset changes the hash and voids the token.
    mac.update(format!("{}:{}:{}", customer.id, customer.password_hash, timestamp).as_bytes());
    mac
}

/// Stateless, signed, time-limited token: `<timestamp base36>-<hmac hex>`.
pub fn make_token(secret: &str, customer: &Customer) -> String {
    make_token_at(secret, customer, Utc::now().timestamp())
}

pub fn make_token_at(secret: &str, customer: &Customer, timestamp: i64) -> String {
    let mac = signature(secret, customer, timestamp);
    let sig = base16ct::lower::encode_string(&mac.finalize().into_bytes());
    format!("{}-{}", to_base36(timestamp), sig)
}

pub fn check_token(secret: &str, customer: &Customer, token: &str) -> bool {
    let Some((ts_part, sig_part)) = token.split_once('-') else {
        return false;
    };
    let Ok(timestamp) = i64::from_str_radix(ts_part, 36) else {
        return false;
    };

    let now = Utc::now().timestamp();
    if now < timestamp || now - timestamp > RESET_TOKEN_MAX_AGE_SECS {
        return false;
    }

    let Ok(sig) = base16ct::lower::decode_vec(sig_part.as_bytes()) else {
        return false;
    };
    signature(secret, customer, timestamp)
        .verify_slice(&sig)
        .is_ok()
}

pub fn encode_uid(customer_id: &str) -> String {
    URL_SAFE_NO_PAD.encode(customer_id)
}

pub fn decode_uid(encoded: &str) -> Option<String> {
    URL_SAFE_NO_PAD
        .decode(encoded)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
}
