//! Deterministic canonicalization of request parameters.
//!
//! Produces the `k1=v1&k2=v2` string that feeds both signature
//! computation (lexicographic order) and repeat-submit fingerprinting
//! (insertion order). The two orders must stay independent: sorting is a
//! per-call decision, never baked into the snapshot.

use std::collections::{BTreeSet, HashSet};

use crate::models::ParamSnapshot;

/// Reserved key under which a non-object JSON body joins the parameter
/// set.
pub const BODY_KEY: &str = "body";

/// Self-referential signature field, always excluded before joining.
pub const SIGN_FIELD: &str = "sign";

/// Join order for [`canonical_string`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOrder {
    /// Source insertion order: query params, then multipart digests, then
    /// body fields. Cheap; used for fingerprinting.
    Insertion,
    /// Lexicographic key order; sort-stable and identical across client
    /// and server. Used for signing.
    Lexicographic,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CanonicalError {
    /// The same key appeared in more than one parameter source. The
    /// caller must rename, not rely on silent precedence.
    #[error("duplicate parameter key across sources: {0}")]
    DuplicateKey(String),
}

/// Canonicalize the full snapshot.
pub fn canonical_string(
    snapshot: &ParamSnapshot,
    order: JoinOrder,
) -> Result<String, CanonicalError> {
    canonical_string_excluding(snapshot, order, &BTreeSet::new())
}

/// Canonicalize with an extra set of excluded keys (used by the
/// repeat-submit guard). The `sign` field is always excluded.
pub fn canonical_string_excluding(
    snapshot: &ParamSnapshot,
    order: JoinOrder,
    excluded: &BTreeSet<String>,
) -> Result<String, CanonicalError> {
    let mut pairs: Vec<(&str, &str)> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    let sources = [
        snapshot.url_params(),
        snapshot.multipart_digests(),
        snapshot.body_fields(),
    ];
    for source in sources {
        for (key, value) in source {
            if key == SIGN_FIELD || excluded.contains(key) {
                continue;
            }
            // An empty value is indistinguishable from an absent one.
            if value.is_empty() {
                continue;
            }
            if !seen.insert(key.as_str()) {
                return Err(CanonicalError::DuplicateKey(key.clone()));
            }
            pairs.push((key.as_str(), value.as_str()));
        }
    }

    if let Some(scalar) = snapshot.body_scalar() {
        if !scalar.is_empty() && !excluded.contains(BODY_KEY) {
            if !seen.insert(BODY_KEY) {
                return Err(CanonicalError::DuplicateKey(BODY_KEY.to_string()));
            }
            pairs.push((BODY_KEY, scalar));
        }
    }

    if order == JoinOrder::Lexicographic {
        pairs.sort_by(|a, b| a.0.cmp(b.0));
    }

    let joined = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    Ok(joined)
}
