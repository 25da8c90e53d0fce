//! HMAC answer for the server's connection challenge.

use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Computes the lowercase hex HMAC-SHA512 of `challenge`, keyed with the
/// concatenation of the application key and the HMAC key.
pub fn compute_hmac(challenge: &str, application_key: &str, hmac_key: &str) -> String {
    let key = format!("{application_key}{hmac_key}");
    let mut mac = HmacSha512::new_from_slice(key.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
    mac.update(challenge.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
