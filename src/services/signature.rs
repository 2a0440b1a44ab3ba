//! Request signature computation and verification.
//!
//! The signing string is the lexicographic canonical parameter string
//! with `&timestamp=<ts>&nonce=<nonce>` appended; the digest is
//! HMAC-SHA256 keyed by the shared secret, rendered as lowercase hex.
//! Client and server must agree on this bit-for-bit.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::models::{ParamSnapshot, Rejection, SigningContext};
use crate::services::canonical::{self, JoinOrder};

type HmacSha256 = Hmac<Sha256>;

/// Compute the signature for the given snapshot and signing inputs.
///
/// Pure: the same inputs always produce the same digest. A duplicate
/// parameter key is a caller error and surfaces as `PARAMETER_ERROR`.
pub fn sign(
    snapshot: &ParamSnapshot,
    nonce: &str,
    timestamp_ms: i64,
    secret: &str,
) -> Result<String, Rejection> {
    let mut message = canonical::canonical_string(snapshot, JoinOrder::Lexicographic)
        .map_err(|_| Rejection::ParameterError)?;
    if !message.is_empty() {
        message.push('&');
    }
    message.push_str(&format!("timestamp={timestamp_ms}&nonce={nonce}"));

    // HMAC-SHA256 accepts keys of any length; this branch cannot fire.
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| Rejection::SignError)?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Recompute the digest and compare it to the one the client supplied.
///
/// The comparison is constant-time (`Mac::verify_slice`). Every mismatch,
/// including malformed hex, is the uniform `SIGN_ERROR`; callers learn
/// nothing about which sub-check failed.
pub fn verify(
    snapshot: &ParamSnapshot,
    ctx: &SigningContext,
    secret: &str,
) -> Result<(), Rejection> {
    let mut message = canonical::canonical_string(snapshot, JoinOrder::Lexicographic)
        .map_err(|_| Rejection::ParameterError)?;
    if !message.is_empty() {
        message.push('&');
    }
    message.push_str(&format!(
        "timestamp={}&nonce={}",
        ctx.timestamp_ms, ctx.nonce
    ));

    let supplied = hex::decode(&ctx.signature).map_err(|_| Rejection::SignError)?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| Rejection::SignError)?;
    mac.update(message.as_bytes());
    mac.verify_slice(&supplied).map_err(|_| Rejection::SignError)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pairs: &[(&str, &str)]) -> ParamSnapshot {
        let mut builder = ParamSnapshot::builder();
        for (k, v) in pairs {
            builder = builder.url_param(*k, *v);
        }
        builder.build()
    }

    fn ctx(signature: String) -> SigningContext {
        SigningContext {
            timestamp_ms: 1_700_000_000_000,
            nonce: "n1".to_string(),
            signature,
        }
    }

    #[test]
    fn sign_is_deterministic() {
        let snap = snapshot(&[("a", "1"), ("b", "2")]);
        let first = sign(&snap, "n1", 1_700_000_000_000, "s").unwrap();
        let second = sign(&snap, "n1", 1_700_000_000_000, "s").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn sign_is_order_independent() {
        let a = sign(&snapshot(&[("a", "1"), ("b", "2")]), "n1", 1_700_000_000_000, "s").unwrap();
        let b = sign(&snapshot(&[("b", "2"), ("a", "1")]), "n1", 1_700_000_000_000, "s").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn verify_accepts_what_sign_produces() {
        let snap = snapshot(&[("a", "1"), ("b", "2")]);
        let digest = sign(&snap, "n1", 1_700_000_000_000, "s").unwrap();
        assert!(verify(&snap, &ctx(digest), "s").is_ok());
    }

    #[test]
    fn verify_rejects_single_character_mutation() {
        let snap = snapshot(&[("a", "1")]);
        let digest = sign(&snap, "n1", 1_700_000_000_000, "s").unwrap();
        let mut chars: Vec<char> = digest.chars().collect();
        chars[0] = if chars[0] == '0' { '1' } else { '0' };
        let mutated: String = chars.into_iter().collect();
        assert_eq!(
            verify(&snap, &ctx(mutated), "s").unwrap_err(),
            Rejection::SignError
        );
    }

    #[test]
    fn verify_rejects_malformed_hex_uniformly() {
        let snap = snapshot(&[("a", "1")]);
        assert_eq!(
            verify(&snap, &ctx("not-hex!".to_string()), "s").unwrap_err(),
            Rejection::SignError
        );
    }

    #[test]
    fn different_secret_produces_different_digest() {
        let snap = snapshot(&[("a", "1")]);
        let one = sign(&snap, "n1", 1_700_000_000_000, "s1").unwrap();
        let two = sign(&snap, "n1", 1_700_000_000_000, "s2").unwrap();
        assert_ne!(one, two);
    }

    #[test]
    fn supplied_sign_field_is_excluded_from_signing() {
        let plain = snapshot(&[("a", "1")]);
        let with_sign = snapshot(&[("a", "1"), ("sign", "ffff")]);
        let one = sign(&plain, "n1", 1_700_000_000_000, "s").unwrap();
        let two = sign(&with_sign, "n1", 1_700_000_000_000, "s").unwrap();
        assert_eq!(one, two);
    }
}
